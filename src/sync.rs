//! Critical-section strategies.
//!
//! The engine's store and statistics are one mutable block guarded by a
//! [`parking_lot::Mutex`]; the strategy, chosen once at construction from
//! the `thread_safe` flag, decides how much of the fetch-or-compute
//! sequence a single section covers:
//!
//! - [`ConcurrencyGuard::Serialized`]: one section spans lookup,
//!   computation, store, and statistics. Concurrent callers of the same
//!   uncached key are serialized and the computation runs exactly once (no
//!   cache stampede), at the price of serializing unrelated keys' misses
//!   too.
//! - [`ConcurrencyGuard::Relaxed`]: no section spans the computation; the
//!   lookup and the store each take their own short section. Concurrent
//!   misses on the same key may each run the computation and the last
//!   writer wins. Uncontended `parking_lot` locks are a few atomic
//!   operations, so this is the minimal-overhead mode, and it tolerates
//!   computations that re-enter the cache.
//!
//! A `Mutex` rather than an `RwLock` because every lookup is a write: LRU
//! refreshes recency, LFU bumps frequency, TTL may remove an expired entry,
//! and the hit counter always moves. A read lock could never be taken.

use parking_lot::Mutex;

/// The two interchangeable critical-section strategies.
///
/// The controller matches on the variant in its fetch path; everything else
/// goes through [`ConcurrencyGuard::enter`], which is one section in both
/// modes.
pub(crate) enum ConcurrencyGuard<T> {
    /// One section spans the whole fetch-or-compute sequence.
    Serialized(Mutex<T>),
    /// Sections cover individual cache operations only; the computation
    /// runs unlocked.
    Relaxed(Mutex<T>),
}

impl<T> ConcurrencyGuard<T> {
    pub(crate) fn new(thread_safe: bool, inner: T) -> Self {
        if thread_safe {
            ConcurrencyGuard::Serialized(Mutex::new(inner))
        } else {
            ConcurrencyGuard::Relaxed(Mutex::new(inner))
        }
    }

    /// Runs `f` as one critical section over the guarded state.
    pub(crate) fn enter<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (ConcurrencyGuard::Serialized(lock) | ConcurrencyGuard::Relaxed(lock)) = self;
        f(&mut lock.lock())
    }
}

impl<T> std::fmt::Debug for ConcurrencyGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let strategy = match self {
            ConcurrencyGuard::Serialized(_) => "Serialized",
            ConcurrencyGuard::Relaxed(_) => "Relaxed",
        };
        f.debug_tuple("ConcurrencyGuard").field(&strategy).finish()
    }
}
