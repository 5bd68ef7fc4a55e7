//! Cache configuration.
//!
//! [`CacheConfig`] collects the four knobs of a cache instance: entry
//! capacity, eviction algorithm, time-to-live, and thread-safety. Fields
//! are public for direct struct construction; the fluent setters exist for
//! call-site ergonomics. Validation happens once, in
//! [`crate::MemoCache::new`].
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use memocache::{Algorithm, CacheConfig};
//!
//! let config = CacheConfig::new()
//!     .max_size(512)
//!     .algorithm(Algorithm::Lfu)
//!     .ttl(Duration::from_secs(60));
//! assert!(config.thread_safe); // the default
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Eviction algorithm for a bounded cache.
///
/// Irrelevant when `max_size` is unset; an unbounded cache never evicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Least recently used: hits refresh recency, the stalest entry goes.
    #[default]
    Lru,
    /// Least frequently used: hits bump a frequency counter, the lowest
    /// frequency goes, oldest-inserted first on ties.
    Lfu,
    /// First in, first out: hits change nothing, the oldest entry goes.
    Fifo,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Lru => "LRU",
            Algorithm::Lfu => "LFU",
            Algorithm::Fifo => "FIFO",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(Algorithm::Lru),
            "lfu" => Ok(Algorithm::Lfu),
            "fifo" => Ok(Algorithm::Fifo),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

/// Configuration for one [`crate::MemoCache`] instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for stored results. `None` means entries never expire.
    pub ttl: Option<Duration>,
    /// Maximum number of entries. `None` means unbounded (no eviction).
    pub max_size: Option<usize>,
    /// Eviction algorithm applied when `max_size` is reached.
    pub algorithm: Algorithm,
    /// Whether one critical section spans the whole fetch-or-compute
    /// sequence. See [`crate::MemoCache::fetch_or_compute`] for the exact
    /// trade-off.
    pub thread_safe: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl: None,
            max_size: None,
            algorithm: Algorithm::default(),
            thread_safe: true,
        }
    }
}

impl CacheConfig {
    /// The default configuration: unbounded, no expiry, LRU, thread-safe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time-to-live for stored results.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Bounds the cache to `max_size` entries. Zero is rejected at
    /// construction.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Selects the eviction algorithm.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enables or disables the serialized critical section.
    pub fn thread_safe(mut self, thread_safe: bool) -> Self {
        self.thread_safe = thread_safe;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == Some(0) {
            return Err(ConfigError::ZeroMaxSize);
        }
        Ok(())
    }
}
