//! Call-signature to cache-key derivation.
//!
//! A call signature is a list of positional arguments plus a set of named
//! (keyword) arguments, modelled by [`CallArgs`]. The [`KeyBuilder`] turns a
//! signature into a [`CacheKey`] in three steps:
//!
//! 1. Probe every argument's capabilities. An argument that supports neither
//!    hashing nor equality makes key construction fail, which the controller
//!    treats as "bypass the cache for this call".
//! 2. Canonicalize: keyword arguments are sorted by name so that call-order
//!    differences never change identity.
//! 3. Hash. If every part hashes, the key is `Hashable` and carries a
//!    precomputed 64-bit hash for O(1) bucket lookup. If any part only
//!    supports equality (floats, or opaque arguments without a stable
//!    hash), the whole key is `Structural` and is matched by full equality
//!    against every stored structural key, O(m). That scan is the documented
//!    price of supporting arbitrary argument shapes.
//!
//! Keys are type-sensitive: each [`ArgValue`] variant mixes its own
//! discriminant into the hash and never compares equal to another variant,
//! so `arg(3)` and `arg(3.0)` are distinct entries.

use core::hash::{BuildHasher, Hasher};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hashbrown::DefaultHashBuilder;

use crate::error::KeyBuildError;

/// A user-defined argument that does not fit the built-in [`ArgValue`]
/// shapes.
///
/// Implementations choose their capabilities:
///
/// - Override [`DynArg::stable_hash`] to join the hashed fast path. The hash
///   must be stable for the lifetime of the process and equal hashes should
///   imply equal arguments.
/// - Override [`DynArg::dyn_eq`] to join the structural path. Downcast
///   `other` to the concrete type and compare; return `Some(false)` for a
///   type mismatch.
/// - Override neither and every call carrying the argument bypasses the
///   cache (computed, returned, never stored).
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use memocache::DynArg;
///
/// #[derive(Debug)]
/// struct UserRef { id: u64 }
///
/// impl DynArg for UserRef {
///     fn stable_hash(&self) -> Option<u64> {
///         Some(self.id)
///     }
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait DynArg: fmt::Debug + Send + Sync + 'static {
    /// Stable hash of this argument, or `None` when hashing is unsupported.
    fn stable_hash(&self) -> Option<u64> {
        None
    }

    /// Structural equality against another argument, or `None` when
    /// comparison is unsupported.
    fn dyn_eq(&self, other: &dyn Any) -> Option<bool> {
        let _ = other;
        None
    }

    /// The concrete value, for downcasting inside [`DynArg::dyn_eq`].
    fn as_any(&self) -> &dyn Any;
}

/// One argument of a call signature.
///
/// The closed variants cover the common shapes; [`ArgValue::Opaque`] carries
/// any user type through the [`DynArg`] trait. `Float` is deliberately not
/// hashable (IEEE equality is not a hash-compatible equivalence), so any key
/// containing one takes the structural path; float equality is bitwise, so a
/// NaN argument still matches itself.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// The absence of a value.
    Unit,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number. Structural-only; compared by bit pattern.
    Float(f64),
    /// A string.
    Str(String),
    /// A byte string.
    Bytes(Vec<u8>),
    /// An ordered sequence of arguments.
    Seq(Vec<ArgValue>),
    /// A user-defined argument. Capabilities come from its [`DynArg`] impl.
    Opaque(Arc<dyn DynArg>),
}

// Discriminants mixed into the hash so values of different shapes never
// collide into the same key.
const TAG_UNIT: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_STR: u8 = 3;
const TAG_BYTES: u8 = 4;
const TAG_SEQ: u8 = 5;
const TAG_OPAQUE: u8 = 6;

impl ArgValue {
    /// Wraps a byte string.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ArgValue::Bytes(bytes.into())
    }

    /// Wraps a sequence of arguments.
    pub fn seq(items: impl Into<Vec<ArgValue>>) -> Self {
        ArgValue::Seq(items.into())
    }

    /// Wraps a user-defined argument.
    pub fn opaque(arg: impl DynArg) -> Self {
        ArgValue::Opaque(Arc::new(arg))
    }

    /// True when the argument supports at least structural equality.
    /// Hashable arguments always do; an opaque argument qualifies if either
    /// capability is present.
    fn is_comparable(&self) -> bool {
        match self {
            ArgValue::Float(_) => true,
            ArgValue::Seq(items) => items.iter().all(ArgValue::is_comparable),
            ArgValue::Opaque(arg) => {
                arg.stable_hash().is_some() || arg.dyn_eq(arg.as_any()).is_some()
            }
            _ => true,
        }
    }

    /// Feeds the argument into `hasher`. Returns false when any part is
    /// unhashable, in which case the hasher state is meaningless.
    fn hash_into<H: Hasher>(&self, hasher: &mut H) -> bool {
        match self {
            ArgValue::Unit => hasher.write_u8(TAG_UNIT),
            ArgValue::Bool(b) => {
                hasher.write_u8(TAG_BOOL);
                hasher.write_u8(*b as u8);
            }
            ArgValue::Int(n) => {
                hasher.write_u8(TAG_INT);
                hasher.write_i64(*n);
            }
            ArgValue::Float(_) => return false,
            ArgValue::Str(s) => {
                hasher.write_u8(TAG_STR);
                hasher.write_usize(s.len());
                hasher.write(s.as_bytes());
            }
            ArgValue::Bytes(b) => {
                hasher.write_u8(TAG_BYTES);
                hasher.write_usize(b.len());
                hasher.write(b);
            }
            ArgValue::Seq(items) => {
                hasher.write_u8(TAG_SEQ);
                hasher.write_usize(items.len());
                for item in items {
                    if !item.hash_into(hasher) {
                        return false;
                    }
                }
            }
            ArgValue::Opaque(arg) => match arg.stable_hash() {
                Some(h) => {
                    hasher.write_u8(TAG_OPAQUE);
                    hasher.write_u64(h);
                }
                None => return false,
            },
        }
        true
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgValue::Unit, ArgValue::Unit) => true,
            (ArgValue::Bool(a), ArgValue::Bool(b)) => a == b,
            (ArgValue::Int(a), ArgValue::Int(b)) => a == b,
            // Bitwise, so NaN keys self-match and 0.0 != -0.0.
            (ArgValue::Float(a), ArgValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ArgValue::Str(a), ArgValue::Str(b)) => a == b,
            (ArgValue::Bytes(a), ArgValue::Bytes(b)) => a == b,
            (ArgValue::Seq(a), ArgValue::Seq(b)) => a == b,
            (ArgValue::Opaque(a), ArgValue::Opaque(b)) => match a.dyn_eq(b.as_any()) {
                Some(verdict) => verdict,
                // Hash-only opaques compare by hash; the probe in
                // KeyBuilder::build rejects arguments with no capability at
                // all before a comparison can be reached.
                None => match (a.stable_hash(), b.stable_hash()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                },
            },
            _ => false,
        }
    }
}

impl From<()> for ArgValue {
    fn from(_: ()) -> Self {
        ArgValue::Unit
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v.into())
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Int(v.into())
    }
}

impl From<f32> for ArgValue {
    fn from(v: f32) -> Self {
        ArgValue::Float(v.into())
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<Vec<ArgValue>> for ArgValue {
    fn from(v: Vec<ArgValue>) -> Self {
        ArgValue::Seq(v)
    }
}

/// A call signature: positional arguments in order plus named arguments.
///
/// # Examples
///
/// ```
/// use memocache::CallArgs;
///
/// let args = CallArgs::new()
///     .arg(42)
///     .arg("query")
///     .kwarg("limit", 10)
///     .kwarg("exact", true);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    keyword: Vec<(String, ArgValue)>,
}

impl CallArgs {
    /// An empty signature (a zero-argument call).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a named argument. The order kwargs are added in does not affect
    /// the derived key.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    pub(crate) fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    pub(crate) fn keyword(&self) -> &[(String, ArgValue)] {
        &self.keyword
    }
}

/// The canonical argument list a key is derived from: positional arguments
/// in call order followed by keyword pairs sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KeyParts {
    positional: Vec<ArgValue>,
    keyword: Vec<(String, ArgValue)>,
}

/// Identity of one call, as stored and looked up by the eviction stores.
#[derive(Debug, Clone)]
pub(crate) enum CacheKey {
    /// Every part hashes; lookup goes through a hash bucket in O(1).
    Hashable { hash: u64, parts: KeyParts },
    /// At least one part only supports equality; lookup compares against
    /// every stored structural key.
    Structural { parts: KeyParts },
}

impl CacheKey {
    #[cfg(test)]
    pub(crate) fn is_hashable(&self) -> bool {
        matches!(self, CacheKey::Hashable { .. })
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                CacheKey::Hashable { hash: a, parts: pa },
                CacheKey::Hashable { hash: b, parts: pb },
            ) => a == b && pa == pb,
            (CacheKey::Structural { parts: pa }, CacheKey::Structural { parts: pb }) => pa == pb,
            _ => false,
        }
    }
}

/// Derives [`CacheKey`]s from [`CallArgs`].
///
/// Owns the hash builder so every key produced by one cache instance hashes
/// consistently.
#[derive(Clone, Default)]
pub(crate) struct KeyBuilder {
    hash_builder: DefaultHashBuilder,
}

impl fmt::Debug for KeyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBuilder").finish()
    }
}

impl KeyBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Builds the key for a call signature.
    ///
    /// Fails only when an argument supports neither hashing nor equality;
    /// the caller must then run the computation uncached.
    pub(crate) fn build(&self, args: &CallArgs) -> Result<CacheKey, KeyBuildError> {
        for (index, value) in args.positional().iter().enumerate() {
            if !value.is_comparable() {
                return Err(KeyBuildError::UnsupportedPositional(index));
            }
        }
        for (name, value) in args.keyword() {
            if !value.is_comparable() {
                return Err(KeyBuildError::UnsupportedKeyword(name.clone()));
            }
        }

        let mut keyword = args.keyword().to_vec();
        keyword.sort_by(|a, b| a.0.cmp(&b.0));
        let parts = KeyParts {
            positional: args.positional().to_vec(),
            keyword,
        };

        let mut hasher = self.hash_builder.build_hasher();
        hasher.write_usize(parts.positional.len());
        let mut hashable = true;
        for value in &parts.positional {
            if !value.hash_into(&mut hasher) {
                hashable = false;
                break;
            }
        }
        if hashable {
            hasher.write_usize(parts.keyword.len());
            for (name, value) in &parts.keyword {
                hasher.write_usize(name.len());
                hasher.write(name.as_bytes());
                if !value.hash_into(&mut hasher) {
                    hashable = false;
                    break;
                }
            }
        }

        if hashable {
            Ok(CacheKey::Hashable {
                hash: hasher.finish(),
                parts,
            })
        } else {
            Ok(CacheKey::Structural { parts })
        }
    }
}
