//! Least Frequently Used eviction store.
//!
//! Entries are grouped into frequency buckets: a `BTreeMap` from access
//! count to a list of the entries currently at that count, plus a pointer
//! to the minimum occupied frequency. A hit releases the entry's node from
//! its bucket, adopts it into the bucket one higher (creating it on
//! demand), drops the old bucket if that emptied it, and advances the
//! minimum-frequency pointer when the emptied bucket was the minimum.
//!
//! Insertion starts every entry at frequency 1 and resets the minimum to 1.
//! Eviction pops the back of the minimum-frequency bucket; since arrivals
//! are pushed at the front, the back is the oldest arrival, giving the
//! first-in-first-out tie-break among entries of equal frequency.
//!
//! Bucket moves touch a bounded number of nodes and the map is keyed by
//! frequency, so get/put/evict stay O(1) amortized (bucket lookups are
//! O(log f) in the number of distinct frequencies, which is bounded by the
//! access count and in practice tiny).

use core::num::NonZeroUsize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use crate::index::KeyIndex;
use crate::key::CacheKey;
use crate::list::{List, Node};
use crate::store::{EvictionStore, Slot};

pub(crate) struct LfuStore<V> {
    capacity: Option<NonZeroUsize>,
    /// Lowest frequency with a non-empty bucket, 1 when the store is empty.
    min_frequency: u64,
    index: KeyIndex<(u64, *mut Node<Slot<V>>)>,
    buckets: BTreeMap<u64, List<Slot<V>>>,
}

// SAFETY: the raw pointers in `index` only ever reference nodes owned by
// `buckets`, and all access goes through &mut self behind the engine's
// guard.
unsafe impl<V: Send> Send for LfuStore<V> {}

impl<V> LfuStore<V> {
    pub(crate) fn new(capacity: Option<NonZeroUsize>) -> Self {
        LfuStore {
            capacity,
            min_frequency: 1,
            index: KeyIndex::new(),
            buckets: BTreeMap::new(),
        }
    }

    fn at_capacity(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.index.len() >= cap.get())
    }

    /// Moves a hit node from its current bucket to the next-higher one and
    /// maintains the minimum-frequency pointer.
    ///
    /// # Safety
    ///
    /// `node` must be the indexed node for `key`, currently linked into the
    /// bucket for `frequency`.
    unsafe fn bump(&mut self, key: &CacheKey, frequency: u64, node: *mut Node<Slot<V>>) {
        let next = frequency + 1;

        let emptied = {
            let Some(bucket) = self.buckets.get_mut(&frequency) else {
                debug_assert!(false, "indexed frequency has no bucket");
                return;
            };
            // SAFETY: caller guarantees node is linked into this bucket.
            unsafe { bucket.release(node) };
            bucket.is_empty()
        };
        if emptied {
            self.buckets.remove(&frequency);
            if self.min_frequency == frequency {
                self.min_frequency = next;
            }
        }

        // SAFETY: node was released above and is adopted exactly once.
        unsafe {
            self.buckets
                .entry(next)
                .or_insert_with(List::new)
                .adopt_front(node);
        }

        if let Some(entry) = self.index.get_mut(key) {
            entry.0 = next;
        }
    }

    /// Evicts the oldest arrival in the minimum-frequency bucket.
    fn evict_one(&mut self) -> Option<CacheKey> {
        let min = self.min_frequency;
        let (key, emptied) = {
            let bucket = self.buckets.get_mut(&min)?;
            let node = bucket.pop_back()?;
            let slot = Node::into_value(node);
            (slot.key, bucket.is_empty())
        };
        self.index.remove(&key);
        if emptied {
            self.buckets.remove(&min);
        }
        Some(key)
    }
}

impl<V> EvictionStore<V> for LfuStore<V> {
    fn get(&mut self, key: &CacheKey) -> Option<&V> {
        let (frequency, node) = *self.index.get(key)?;
        // SAFETY: node comes from our index and sits in the bucket the
        // index records for it.
        unsafe {
            self.bump(key, frequency, node);
            Some(&(*node).value().value)
        }
    }

    fn deadline(&self, key: &CacheKey) -> Option<Option<Instant>> {
        let (_, node) = *self.index.get(key)?;
        // SAFETY: node comes from our index, so it is linked into a bucket.
        Some(unsafe { (*node).value().deadline })
    }

    fn put(&mut self, key: CacheKey, value: V, deadline: Option<Instant>) -> Option<CacheKey> {
        if let Some(&(_, node)) = self.index.get(&key) {
            // SAFETY: node comes from our index. Updating keeps the entry's
            // accumulated frequency.
            unsafe {
                let slot = (*node).value_mut();
                slot.value = value;
                slot.deadline = deadline;
            }
            return None;
        }

        let mut evicted = None;
        if self.at_capacity() {
            evicted = self.evict_one();
            debug_assert!(evicted.is_some(), "bounded non-empty store must evict");
        }

        // New entries always start at frequency 1.
        self.min_frequency = 1;
        let node = self.buckets.entry(1).or_insert_with(List::new).push_front(Slot {
            key: key.clone(),
            value,
            deadline,
        });
        self.index.insert(&key, (1, node));
        evicted
    }

    fn remove(&mut self, key: &CacheKey) -> bool {
        let Some((frequency, node)) = self.index.remove(key) else {
            return false;
        };
        let emptied = {
            let Some(bucket) = self.buckets.get_mut(&frequency) else {
                debug_assert!(false, "indexed frequency has no bucket");
                return true;
            };
            // SAFETY: node came from our index, so it is linked into this
            // bucket; unlink hands ownership back and the box frees it.
            drop(unsafe { bucket.unlink(node) });
            bucket.is_empty()
        };
        if emptied {
            self.buckets.remove(&frequency);
            if self.min_frequency == frequency {
                // Empty buckets are dropped eagerly, so the smallest
                // remaining bucket is the new minimum.
                self.min_frequency = self.buckets.keys().next().copied().unwrap_or(1);
            }
        }
        true
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn remove_expired(&mut self, now: Instant) -> usize {
        let stale: Vec<CacheKey> = self
            .index
            .payloads()
            .filter_map(|&(_, node)| {
                // SAFETY: every indexed node is linked into a bucket.
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
        self.buckets.clear();
        self.min_frequency = 1;
    }
}

impl<V> fmt::Debug for LfuStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuStore")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("min_frequency", &self.min_frequency)
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

    fn bounded(cap: usize) -> LfuStore<i64> {
        LfuStore::new(Some(NonZeroUsize::new(cap).unwrap()))
    }

    #[test]
    fn evicts_lowest_frequency() {
        let builder = KeyBuilder::new();
        let mut store = bounded(2);
        store.put(key(&builder, 1), 10, None);
        store.put(key(&builder, 2), 20, None);

        // 1 reaches frequency 3, 2 stays at 1
        store.get(&key(&builder, 1));
        store.get(&key(&builder, 1));

        let evicted = store.put(key(&builder, 3), 30, None).unwrap();
        assert_eq!(evicted, key(&builder, 2));
        assert_eq!(store.get(&key(&builder, 1)), Some(&10));
        assert_eq!(store.get(&key(&builder, 3)), Some(&30));
    }

    #[test]
    fn frequency_ties_break_by_insertion_order() {
        let builder = KeyBuilder::new();
        let mut store = bounded(2);
        store.put(key(&builder, 1), 10, None);
        store.put(key(&builder, 2), 20, None);

        // both at frequency 1; the earlier insertion goes first
        let evicted = store.put(key(&builder, 3), 30, None).unwrap();
        assert_eq!(evicted, key(&builder, 1));
        assert_eq!(store.get(&key(&builder, 2)), Some(&20));
    }

    #[test]
    fn new_entries_compete_at_frequency_one() {
        let builder = KeyBuilder::new();
        let mut store = bounded(2);
        store.put(key(&builder, 1), 10, None);
        store.get(&key(&builder, 1));
        store.put(key(&builder, 2), 20, None);

        // 2 is the only frequency-1 entry, so it goes despite being newest
        let evicted = store.put(key(&builder, 3), 30, None).unwrap();
        assert_eq!(evicted, key(&builder, 2));
    }

    #[test]
    fn put_of_existing_key_preserves_frequency() {
        let builder = KeyBuilder::new();
        let mut store = bounded(2);
        store.put(key(&builder, 1), 10, None);
        store.get(&key(&builder, 1)); // frequency 2
        assert_eq!(store.put(key(&builder, 1), 11, None), None);
        store.put(key(&builder, 2), 20, None);

        // 1 kept its frequency through the update, so 2 is evicted
        let evicted = store.put(key(&builder, 3), 30, None).unwrap();
        assert_eq!(evicted, key(&builder, 2));
        assert_eq!(store.get(&key(&builder, 1)), Some(&11));
    }

    #[test]
    fn remove_recomputes_minimum_frequency() {
        let builder = KeyBuilder::new();
        let mut store = bounded(3);
        store.put(key(&builder, 1), 10, None);
        store.put(key(&builder, 2), 20, None);
        store.get(&key(&builder, 2)); // 2 at frequency 2

        // removing the only frequency-1 entry moves the minimum up to 2
        assert!(store.remove(&key(&builder, 1)));
        store.put(key(&builder, 3), 30, None);
        store.put(key(&builder, 4), 40, None);

        // 3 and 4 sit at frequency 1; oldest of them is the candidate
        let evicted = store.put(key(&builder, 5), 50, None).unwrap();
        assert_eq!(evicted, key(&builder, 3));
        assert_eq!(store.get(&key(&builder, 2)), Some(&20));
    }

    #[test]
    fn remove_expired_sweeps_only_stale_entries() {
        let builder = KeyBuilder::new();
        let mut store = bounded(4);
        let now = Instant::now();
        store.put(key(&builder, 1), 10, Some(now));
        store.put(key(&builder, 2), 20, None);
        store.get(&key(&builder, 2));
        assert_eq!(store.remove_expired(now), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key(&builder, 2)), Some(&20));
    }
}
