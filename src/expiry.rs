//! Time-to-live layer over the eviction store.
//!
//! [`ExpirationTracker`] decorates the boxed [`EvictionStore`] with optional
//! TTL semantics. When a TTL is configured every insertion is stamped with a
//! deadline, and a lookup first checks the deadline *without* touching
//! policy metadata: an entry at or past its deadline is removed on the spot
//! (freeing capacity) and reported as a miss. The removal happens inside
//! the caller's critical section, so no other caller can observe the stale
//! entry or an inconsistent size.
//!
//! Expiry is otherwise lazy: an expired entry that nothing touches stays in
//! memory until [`ExpirationTracker::purge_expired`] sweeps it, which the
//! controller does before reporting the cache size.
//!
//! With no TTL configured, insertions carry no deadline and lookups skip
//! the check entirely.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::key::CacheKey;
use crate::store::EvictionStore;

pub(crate) struct ExpirationTracker<V> {
    store: Box<dyn EvictionStore<V> + Send>,
    ttl: Option<Duration>,
}

impl<V> ExpirationTracker<V> {
    pub(crate) fn new(store: Box<dyn EvictionStore<V> + Send>, ttl: Option<Duration>) -> Self {
        ExpirationTracker { store, ttl }
    }

    /// Looks up a live entry, removing it first if its deadline has passed.
    pub(crate) fn lookup(&mut self, key: &CacheKey) -> Option<&V> {
        if self.ttl.is_some() {
            if let Some(Some(deadline)) = self.store.deadline(key) {
                if Instant::now() >= deadline {
                    self.store.remove(key);
                    trace!("expired entry removed on access");
                    return None;
                }
            }
        }
        self.store.get(key)
    }

    /// Inserts a computed result, stamping the expiry deadline when a TTL
    /// is configured. Returns the key evicted to make room, if any.
    pub(crate) fn insert(&mut self, key: CacheKey, value: V) -> Option<CacheKey> {
        let deadline = self.ttl.map(|ttl| Instant::now() + ttl);
        self.store.put(key, value, deadline)
    }

    /// Sweeps every entry past its deadline so the physical size matches
    /// the number of live entries.
    pub(crate) fn purge_expired(&mut self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let removed = self.store.remove_expired(Instant::now());
        if removed > 0 {
            trace!(removed, "swept expired entries");
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn clear(&mut self) {
        self.store.clear();
    }
}

impl<V> std::fmt::Debug for ExpirationTracker<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationTracker")
            .field("ttl", &self.ttl)
            .field("len", &self.store.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Algorithm;
    use crate::key::{CallArgs, KeyBuilder};
    use crate::store::build_store;
    use std::thread::sleep;

    fn tracker(ttl: Option<Duration>) -> ExpirationTracker<i64> {
        ExpirationTracker::new(build_store(Algorithm::Lru, None), ttl)
    }

    fn key(builder: &KeyBuilder, n: i64) -> CacheKey {
        builder.build(&CallArgs::new().arg(n)).unwrap()
    }

    #[test]
    fn entries_expire_at_their_deadline() {
        let builder = KeyBuilder::new();
        let mut tracker = tracker(Some(Duration::from_millis(40)));
        tracker.insert(key(&builder, 1), 10);

        assert_eq!(tracker.lookup(&key(&builder, 1)), Some(&10));
        sleep(Duration::from_millis(80));
        assert_eq!(tracker.lookup(&key(&builder, 1)), None);
        // the expired entry was physically removed, not just hidden
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn without_ttl_entries_never_expire() {
        let builder = KeyBuilder::new();
        let mut tracker = tracker(None);
        tracker.insert(key(&builder, 1), 10);
        sleep(Duration::from_millis(20));
        assert_eq!(tracker.lookup(&key(&builder, 1)), Some(&10));
        assert_eq!(tracker.purge_expired(), 0);
    }

    #[test]
    fn purge_sweeps_untouched_expired_entries() {
        let builder = KeyBuilder::new();
        let mut tracker = tracker(Some(Duration::from_millis(20)));
        tracker.insert(key(&builder, 1), 10);
        tracker.insert(key(&builder, 2), 20);
        sleep(Duration::from_millis(50));

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.purge_expired(), 2);
        assert_eq!(tracker.len(), 0);
    }
}
