//! First In, First Out eviction store.
//!
//! Entries live on an insertion-ordered queue: insertion pushes at the
//! front, eviction pops the back, and, unlike LRU, a hit changes nothing.
//! The key index still gives O(1) lookup; the queue gives O(1) insert and
//! evict.
//!
//! Useful when every key is about equally likely to recur and the cheapest
//! possible bookkeeping is wanted.

use core::num::NonZeroUsize;
use std::fmt;
use std::time::Instant;

use crate::index::KeyIndex;
use crate::key::CacheKey;
use crate::list::{List, Node};
use crate::store::{EvictionStore, Slot};

pub(crate) struct FifoStore<V> {
    capacity: Option<NonZeroUsize>,
    index: KeyIndex<*mut Node<Slot<V>>>,
    queue: List<Slot<V>>,
}

// SAFETY: the raw pointers in `index` only ever reference nodes owned by
// `queue`, and all access goes through &mut self behind the engine's guard.
unsafe impl<V: Send> Send for FifoStore<V> {}

impl<V> FifoStore<V> {
    pub(crate) fn new(capacity: Option<NonZeroUsize>) -> Self {
        FifoStore {
            capacity,
            index: KeyIndex::new(),
            queue: List::new(),
        }
    }

    fn at_capacity(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.index.len() >= cap.get())
    }
}

impl<V> EvictionStore<V> for FifoStore<V> {
    fn get(&mut self, key: &CacheKey) -> Option<&V> {
        let node = *self.index.get(key)?;
        // SAFETY: node comes from our index, so it is linked into `queue`.
        // A hit does not reorder the queue.
        Some(unsafe { &(*node).value().value })
    }

    fn deadline(&self, key: &CacheKey) -> Option<Option<Instant>> {
        let node = *self.index.get(key)?;
        // SAFETY: node comes from our index, so it is linked into `queue`.
        Some(unsafe { (*node).value().deadline })
    }

    fn put(&mut self, key: CacheKey, value: V, deadline: Option<Instant>) -> Option<CacheKey> {
        if let Some(&node) = self.index.get(&key) {
            // SAFETY: node comes from our index, so it is linked into
            // `queue`. Updates keep the original queue position.
            unsafe {
                let slot = (*node).value_mut();
                slot.value = value;
                slot.deadline = deadline;
            }
            return None;
        }

        let mut evicted = None;
        if self.at_capacity() {
            if let Some(node) = self.queue.pop_back() {
                let slot = Node::into_value(node);
                self.index.remove(&slot.key);
                evicted = Some(slot.key);
            }
        }

        let node = self.queue.push_front(Slot {
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
                // `queue`; unlink hands ownership back and the box frees it.
                drop(unsafe { self.queue.unlink(node) });
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
                // SAFETY: every indexed node is linked into `queue`.
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
        self.queue.clear();
    }
}

impl<V> fmt::Debug for FifoStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoStore")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .finish()
    }
}
