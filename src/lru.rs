//! Least Recently Used eviction store.
//!
//! Entries live on a single recency list: a hit moves the entry's node to
//! the front, insertion pushes at the front, and eviction pops the back,
//! which is the entry untouched for the longest. The key index maps each key to its
//! node, so every operation is O(1) (plus the structural-key scan cost
//! inherited from [`crate::index::KeyIndex`]).
//!
//! Works well when recent calls predict future calls, which is the common
//! case for memoized computations; it is the default policy.

use core::num::NonZeroUsize;
use std::fmt;
use std::time::Instant;

use crate::index::KeyIndex;
use crate::key::CacheKey;
use crate::list::{List, Node};
use crate::store::{EvictionStore, Slot};

pub(crate) struct LruStore<V> {
    capacity: Option<NonZeroUsize>,
    index: KeyIndex<*mut Node<Slot<V>>>,
    order: List<Slot<V>>,
}

// SAFETY: the raw pointers in `index` only ever reference nodes owned by
// `order`, and all access goes through &mut self behind the engine's guard.
unsafe impl<V: Send> Send for LruStore<V> {}

impl<V> LruStore<V> {
    pub(crate) fn new(capacity: Option<NonZeroUsize>) -> Self {
        LruStore {
            capacity,
            index: KeyIndex::new(),
            order: List::new(),
        }
    }

    fn at_capacity(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.index.len() >= cap.get())
    }
}

impl<V> EvictionStore<V> for LruStore<V> {
    fn get(&mut self, key: &CacheKey) -> Option<&V> {
        let node = *self.index.get(key)?;
        // SAFETY: node comes from our index, so it is linked into `order`.
        unsafe {
            self.order.move_to_front(node);
            Some(&(*node).value().value)
        }
    }

    fn deadline(&self, key: &CacheKey) -> Option<Option<Instant>> {
        let node = *self.index.get(key)?;
        // SAFETY: node comes from our index, so it is linked into `order`.
        Some(unsafe { (*node).value().deadline })
    }

    fn put(&mut self, key: CacheKey, value: V, deadline: Option<Instant>) -> Option<CacheKey> {
        if let Some(&node) = self.index.get(&key) {
            // SAFETY: node comes from our index, so it is linked into `order`.
            unsafe {
                let slot = (*node).value_mut();
                slot.value = value;
                slot.deadline = deadline;
                self.order.move_to_front(node);
            }
            return None;
        }

        let mut evicted = None;
        if self.at_capacity() {
            if let Some(node) = self.order.pop_back() {
                let slot = Node::into_value(node);
                self.index.remove(&slot.key);
                evicted = Some(slot.key);
            }
        }

        let node = self.order.push_front(Slot {
            key: key.clone(),
            value,
            deadline,
        });
        self.index.insert(&key, node);
        evicted
    }

    fn remove(&mut self, key: &CacheKey) -> bool {
        match self.index.remove(key) {
            Some(node) => {
                // SAFETY: node came from our index, so it is linked into
                // `order`; unlink hands ownership back and the box frees it.
                drop(unsafe { self.order.unlink(node) });
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn remove_expired(&mut self, now: Instant) -> usize {
        let stale: Vec<CacheKey> = self
            .index
            .payloads()
            .filter_map(|&node| {
                // SAFETY: every indexed node is linked into `order`.
                let slot = unsafe { (*node).value() };
                match slot.deadline {
                    Some(deadline) if now >= deadline => Some(slot.key.clone()),
                    _ => None,
                }
            })
            .collect();
        for key in &stale {
            self.remove(key);
        }
        stale.len()
    }

    fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }
}

impl<V> fmt::Debug for LruStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{CallArgs, KeyBuilder};

    fn key(builder: &KeyBuilder, n: i64) -> CacheKey {
        builder.build(&CallArgs::new().arg(n)).unwrap()
    }

    fn bounded(cap: usize) -> LruStore<i64> {
        LruStore::new(Some(NonZeroUsize::new(cap).unwrap()))
    }

    #[test]
    fn evicts_least_recently_used() {
        let builder = KeyBuilder::new();
        let mut store = bounded(2);
        store.put(key(&builder, 1), 10, None);
        store.put(key(&builder, 2), 20, None);

        // touch 1 so 2 becomes the eviction candidate
        assert_eq!(store.get(&key(&builder, 1)), Some(&10));

        let evicted = store.put(key(&builder, 3), 30, None).unwrap();
        assert_eq!(evicted, key(&builder, 2));
        assert_eq!(store.get(&key(&builder, 2)), None);
        assert_eq!(store.get(&key(&builder, 1)), Some(&10));
        assert_eq!(store.get(&key(&builder, 3)), Some(&30));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn put_of_existing_key_updates_without_eviction() {
        let builder = KeyBuilder::new();
        let mut store = bounded(2);
        store.put(key(&builder, 1), 10, None);
        store.put(key(&builder, 2), 20, None);
        assert_eq!(store.put(key(&builder, 1), 11, None), None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&key(&builder, 1)), Some(&11));
    }

    #[test]
    fn unbounded_store_never_evicts() {
        let builder = KeyBuilder::new();
        let mut store: LruStore<i64> = LruStore::new(None);
        for n in 0..100 {
            assert_eq!(store.put(key(&builder, n), n, None), None);
        }
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn remove_and_clear() {
        let builder = KeyBuilder::new();
        let mut store = bounded(4);
        store.put(key(&builder, 1), 10, None);
        store.put(key(&builder, 2), 20, None);
        assert!(store.contains(&key(&builder, 1)));
        assert!(store.remove(&key(&builder, 1)));
        assert!(!store.remove(&key(&builder, 1)));
        assert!(!store.contains(&key(&builder, 1)));
        assert_eq!(store.len(), 1);
        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.get(&key(&builder, 2)), None);
    }

    #[test]
    fn deadline_reads_do_not_refresh_recency() {
        let builder = KeyBuilder::new();
        let mut store = bounded(2);
        store.put(key(&builder, 1), 10, None);
        store.put(key(&builder, 2), 20, None);

        // peeking at 1 must not rescue it from eviction
        assert_eq!(store.deadline(&key(&builder, 1)), Some(None));
        let evicted = store.put(key(&builder, 3), 30, None).unwrap();
        assert_eq!(evicted, key(&builder, 1));
    }

    #[test]
    fn remove_expired_sweeps_only_stale_entries() {
        let builder = KeyBuilder::new();
        let mut store = bounded(4);
        let now = Instant::now();
        store.put(key(&builder, 1), 10, Some(now));
        store.put(key(&builder, 2), 20, None);
        assert_eq!(store.remove_expired(now), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key(&builder, 2)), Some(&20));
    }
}
