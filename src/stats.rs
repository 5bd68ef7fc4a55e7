//! Hit/miss accounting and the observable statistics snapshot.
//!
//! [`StatsRecorder`] is the mutable counter block the controller updates
//! inside its critical section; [`CacheStats`] is the immutable snapshot
//! handed out by [`crate::MemoCache::info`]. Hits and misses grow
//! monotonically until [`crate::MemoCache::clear`] resets them; a bypassed
//! call (unsupported argument) counts as neither, and a failed computation
//! records nothing.

use std::time::Duration;

use crate::config::Algorithm;

/// Counters mutated by the controller under its guard.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl StatsRecorder {
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Recorded only after a successful computation was stored.
    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub(crate) fn reset(&mut self) {
        *self = StatsRecorder::default();
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits
    }

    pub(crate) fn misses(&self) -> u64 {
        self.misses
    }

    pub(crate) fn evictions(&self) -> u64 {
        self.evictions
    }
}

/// Immutable statistics snapshot for one cache instance.
///
/// `current_size` counts live entries only; the snapshot operation sweeps
/// lazily-expired entries before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls answered from the cache.
    pub hits: u64,
    /// Calls that ran the computation and stored its result.
    pub misses: u64,
    /// Entries removed to make room for new ones.
    pub evictions: u64,
    /// Live entries at snapshot time.
    pub current_size: usize,
    /// Configured entry bound, `None` for an unbounded cache.
    pub max_size: Option<usize>,
    /// Configured eviction algorithm.
    pub algorithm: Algorithm,
    /// Configured time-to-live, `None` when entries never expire.
    pub ttl: Option<Duration>,
    /// Whether the serialized critical section is enabled.
    pub thread_safe: bool,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache, 0.0 with no traffic.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.hits + self.misses;
        if requests == 0 {
            return 0.0;
        }
        self.hits as f64 / requests as f64
    }
}
