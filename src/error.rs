//! Error types for the memoization engine.
//!
//! Only two conditions are expressible as error values: an invalid
//! configuration (fatal at construction) and a call signature that cannot
//! produce a key (recovered internally by bypassing the cache for that one
//! call). Failures of the wrapped computation are the caller's own error
//! type and pass through [`crate::MemoCache::fetch_or_try_compute`]
//! unchanged. Internal bookkeeping inconsistencies are programming errors
//! and assert, they are never surfaced as a recoverable value.

use thiserror::Error;

/// Rejected cache configuration. Fatal at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_size` was zero; a bounded cache needs room for at least one
    /// entry. Leave `max_size` unset for an unbounded cache.
    #[error("max_size must be a positive number of entries")]
    ZeroMaxSize,

    /// An eviction algorithm name that is not `lru`, `lfu` or `fifo`.
    #[error("unknown eviction algorithm: {0:?}")]
    UnknownAlgorithm(String),
}

/// A call signature that cannot be turned into a cache key.
///
/// Raised when an argument supports neither hashing nor equality (an
/// [`crate::ArgValue::Opaque`] whose [`crate::DynArg`] impl overrides
/// neither capability). The engine recovers by running the computation
/// uncached, so this error never reaches the caller of a fetch operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyBuildError {
    /// The positional argument at this index has no usable capability.
    #[error("positional argument {0} supports neither hashing nor equality")]
    UnsupportedPositional(usize),

    /// The named argument has no usable capability.
    #[error("keyword argument {0:?} supports neither hashing nor equality")]
    UnsupportedKeyword(String),
}
