//! The cache controller: fetch-or-compute, clear, and info.
//!
//! [`MemoCache`] composes the key builder, the eviction store (behind its
//! TTL tracker), the statistics recorder, and the critical-section strategy
//! into the three operations a wrapping layer needs. One instance memoizes
//! one computation; construct it explicitly with its [`CacheConfig`] and
//! compose any callable-wrapping sugar on top.
//!
//! Per key an entry is absent, then present after a miss with a successful
//! computation, refreshed on every hit, and absent again after eviction,
//! TTL expiry, or [`MemoCache::clear`].

use core::convert::Infallible;
use core::num::NonZeroUsize;
use std::fmt;

use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::expiry::ExpirationTracker;
use crate::key::{CacheKey, CallArgs, KeyBuilder};
use crate::stats::{CacheStats, StatsRecorder};
use crate::store::build_store;
use crate::sync::ConcurrencyGuard;

/// Everything the guard protects: the store behind its TTL tracker, plus
/// the counters. Mutated only inside a critical section.
pub(crate) struct EngineState<V> {
    tracker: ExpirationTracker<V>,
    stats: StatsRecorder,
}

impl<V: Clone> EngineState<V> {
    /// One lookup: expiry check, policy update, hit accounting.
    fn lookup(&mut self, key: &CacheKey) -> Option<V> {
        let value = self.tracker.lookup(key).cloned();
        if value.is_some() {
            self.stats.record_hit();
        }
        value
    }

    /// Stores a freshly computed result and records the miss.
    fn store(&mut self, key: CacheKey, value: V) {
        if self.tracker.insert(key, value).is_some() {
            self.stats.record_eviction();
            trace!("entry evicted to make room");
        }
        self.stats.record_miss();
    }

    fn clear(&mut self) {
        self.tracker.clear();
        self.stats.reset();
    }
}

/// A memoization cache for one computation.
///
/// `V` is the computation's result type; results are handed out by clone,
/// so keep `V` cheap to clone (or wrap it in `Arc`).
///
/// # Examples
///
/// ```
/// use memocache::{CacheConfig, CallArgs, MemoCache};
///
/// let cache: MemoCache<u64> = MemoCache::new(CacheConfig::new().max_size(64)).unwrap();
///
/// let value = cache.fetch_or_compute(&CallArgs::new().arg(21), || 21 * 2);
/// assert_eq!(value, 42);
/// assert_eq!(cache.info().misses, 1);
/// ```
pub struct MemoCache<V> {
    keys: KeyBuilder,
    guard: ConcurrencyGuard<EngineState<V>>,
    config: CacheConfig,
}

impl<V: Clone + Send + 'static> MemoCache<V> {
    /// Builds a cache from its configuration.
    ///
    /// Fails with a [`ConfigError`] when the configuration is invalid
    /// (`max_size` of zero).
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = config.max_size.and_then(NonZeroUsize::new);
        let store = build_store(config.algorithm, capacity);
        let state = EngineState {
            tracker: ExpirationTracker::new(store, config.ttl),
            stats: StatsRecorder::default(),
        };
        Ok(MemoCache {
            keys: KeyBuilder::new(),
            guard: ConcurrencyGuard::new(config.thread_safe, state),
            config,
        })
    }

    /// Returns the cached result for `args`, or runs `compute` and caches
    /// its result.
    ///
    /// When an argument supports neither hashing nor equality the call
    /// bypasses the cache: `compute` runs, its result is returned, and no
    /// statistics move.
    ///
    /// With `thread_safe` enabled the computation runs while the cache's
    /// internal lock is held, which is what guarantees at most one
    /// execution per key under concurrent callers. It also means a
    /// computation that calls back into the same cache will deadlock.
    /// Recursive computations need `thread_safe(false)`.
    pub fn fetch_or_compute(&self, args: &CallArgs, compute: impl FnOnce() -> V) -> V {
        match self.fetch_or_try_compute(args, || Ok::<V, Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`MemoCache::fetch_or_compute`].
    ///
    /// The computation's error propagates unchanged and nothing is cached:
    /// a failed call leaves the store and the counters exactly as they
    /// were, so the next call with the same arguments computes again.
    pub fn fetch_or_try_compute<E>(
        &self,
        args: &CallArgs,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let key = match self.keys.build(args) {
            Ok(key) => key,
            Err(reason) => {
                debug!(%reason, "uncacheable call signature, bypassing cache");
                return compute();
            }
        };

        match &self.guard {
            ConcurrencyGuard::Serialized(lock) => {
                // The section spans the computation: a second caller with
                // the same key blocks here until the value is stored and
                // then hits.
                let mut state = lock.lock();
                if let Some(value) = state.lookup(&key) {
                    return Ok(value);
                }
                let value = compute()?;
                state.store(key, value.clone());
                Ok(value)
            }
            ConcurrencyGuard::Relaxed(lock) => {
                // The computation runs unlocked: concurrent misses on the
                // same key may each compute, and the last store wins.
                if let Some(value) = lock.lock().lookup(&key) {
                    return Ok(value);
                }
                let value = compute()?;
                lock.lock().store(key, value.clone());
                Ok(value)
            }
        }
    }

    /// Empties the cache and resets the hit, miss, and eviction counters.
    pub fn clear(&self) {
        self.guard.enter(EngineState::clear);
        debug!("cache cleared");
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.guard.enter(|state| {
            state.tracker.purge_expired();
            state.tracker.len()
        })
    }

    /// True when the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshots the cache statistics.
    ///
    /// Sweeps lazily-expired entries first, so `current_size` counts live
    /// entries only.
    pub fn info(&self) -> CacheStats {
        self.guard.enter(|state| {
            state.tracker.purge_expired();
            CacheStats {
                hits: state.stats.hits(),
                misses: state.stats.misses(),
                evictions: state.stats.evictions(),
                current_size: state.tracker.len(),
                max_size: self.config.max_size,
                algorithm: self.config.algorithm,
                ttl: self.config.ttl,
                thread_safe: self.config.thread_safe,
            }
        })
    }
}

impl<V> fmt::Debug for MemoCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("algorithm", &self.config.algorithm)
            .field("max_size", &self.config.max_size)
            .field("ttl", &self.config.ttl)
            .field("guard", &self.guard)
            .finish()
    }
}
