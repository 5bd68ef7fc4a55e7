//! The polymorphic eviction-store contract.
//!
//! All three policies (LRU, LFU, FIFO) implement [`EvictionStore`], the
//! get/put/evict contract the controller programs against. The policy is
//! picked from configuration at construction via [`build_store`], so the
//! controller holds a boxed trait object and never branches on the
//! algorithm again.
//!
//! Capacity is `Option<NonZeroUsize>`: `None` is an unbounded store that
//! never evicts. Eviction happens only when a *new* key is inserted at
//! capacity, and removes exactly one entry; re-inserting an existing key
//! updates its slot in place.

use core::num::NonZeroUsize;
use std::time::Instant;

use crate::config::Algorithm;
use crate::fifo::FifoStore;
use crate::key::CacheKey;
use crate::lfu::LfuStore;
use crate::lru::LruStore;

/// One stored result: the canonical key, the computed value, and the
/// optional expiry deadline stamped by the expiration tracker.
#[derive(Debug)]
pub(crate) struct Slot<V> {
    pub(crate) key: CacheKey,
    pub(crate) value: V,
    pub(crate) deadline: Option<Instant>,
}

/// The common contract of the eviction policies.
///
/// `get` is the only operation that touches policy metadata (recency,
/// frequency); `deadline` exists so the expiration tracker can inspect an
/// entry without recording an access.
pub(crate) trait EvictionStore<V> {
    /// Looks up a live entry and updates the policy's bookkeeping for it.
    fn get(&mut self, key: &CacheKey) -> Option<&V>;

    /// Reads an entry's expiry deadline without touching policy metadata.
    /// `None` means the key is absent; `Some(None)` an entry with no
    /// deadline.
    fn deadline(&self, key: &CacheKey) -> Option<Option<Instant>>;

    /// Whether the key is physically present. Never touches policy
    /// metadata.
    fn contains(&self, key: &CacheKey) -> bool {
        self.deadline(key).is_some()
    }

    /// Inserts or updates an entry, evicting at most one other entry when a
    /// new key arrives at capacity. Returns the evicted key, if any.
    fn put(&mut self, key: CacheKey, value: V, deadline: Option<Instant>) -> Option<CacheKey>;

    /// Removes an entry. Returns whether it was present.
    fn remove(&mut self, key: &CacheKey) -> bool;

    /// Number of physically present entries.
    fn len(&self) -> usize;

    /// Removes every entry whose deadline is at or before `now`. Returns
    /// how many were removed.
    fn remove_expired(&mut self, now: Instant) -> usize;

    /// Removes all entries.
    fn clear(&mut self);
}

/// Constructs the store for the configured algorithm.
pub(crate) fn build_store<V: Send + 'static>(
    algorithm: Algorithm,
    capacity: Option<NonZeroUsize>,
) -> Box<dyn EvictionStore<V> + Send> {
    match algorithm {
        Algorithm::Lru => Box::new(LruStore::new(capacity)),
        Algorithm::Lfu => Box::new(LfuStore::new(capacity)),
        Algorithm::Fifo => Box::new(FifoStore::new(capacity)),
    }
}
