#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Architecture
//!
//! A fetch enters [`MemoCache`], which derives a key from the call
//! signature, takes the critical section chosen at construction, consults
//! the TTL layer over the eviction store, and either returns the stored
//! result (a hit) or runs the computation and stores it (a miss):
//!
//! ```text
//! CallArgs ──▶ KeyBuilder ──▶ CacheKey
//!                                │
//!                                ▼
//!            ┌─────────────────────────────────────┐
//!            │ ConcurrencyGuard (critical section) │
//!            │                                     │
//!            │  ExpirationTracker (TTL check)      │
//!            │        │                            │
//!            │        ▼                            │
//!            │  EvictionStore (LRU | LFU | FIFO)   │
//!            │        │                            │
//!            │        ▼                            │
//!            │  StatsRecorder (hits / misses)      │
//!            └─────────────────────────────────────┘
//! ```
//!
//! # Operation cost
//!
//! | Path | Key kind | Cost |
//! |------|----------|------|
//! | get / put / evict | hashable | O(1) amortized |
//! | get / put / evict | structural | O(m) in stored structural keys |
//! | bypass | unsupported argument | the computation itself, nothing stored |
//!
//! # Modules
//!
//! - [`key`]: call-signature to cache-key derivation
//! - [`config`]: cache configuration and validation
//! - [`stats`]: the observable statistics snapshot
//! - [`error`]: configuration and key-construction errors
//! - [`cache`]: the controller facade

/// Call-signature modelling and cache-key derivation.
///
/// Provides [`ArgValue`] (the closed set of argument shapes plus the
/// [`DynArg`] escape hatch), [`CallArgs`] (one call signature), and the
/// internal key builder with its hashable/structural capability probe.
pub mod key;

/// Intrusive doubly linked list with in-place reordering.
///
/// Internal infrastructure shared by the three eviction stores; exposes raw
/// pointer operations and is not part of the public API.
pub(crate) mod list;

/// Dual-path key index: hash buckets for hashable keys, a scanned list for
/// structural ones.
pub(crate) mod index;

/// The polymorphic eviction-store contract and policy selection.
pub(crate) mod store;

/// Least Recently Used eviction store.
pub(crate) mod lru;

/// Least Frequently Used eviction store with frequency buckets.
pub(crate) mod lfu;

/// First In, First Out eviction store.
pub(crate) mod fifo;

/// Time-to-live expiry layer over the eviction store.
pub(crate) mod expiry;

/// Critical-section strategies: serialized and relaxed.
pub(crate) mod sync;

/// Hit/miss accounting and the statistics snapshot.
pub mod stats;

/// Cache configuration structures and validation.
pub mod config;

/// Error types: invalid configuration and unusable call signatures.
pub mod error;

/// The cache controller: fetch-or-compute, clear, and info.
pub mod cache;

pub use cache::MemoCache;
pub use config::{Algorithm, CacheConfig};
pub use error::{ConfigError, KeyBuildError};
pub use key::{ArgValue, CallArgs, DynArg};
pub use stats::CacheStats;
