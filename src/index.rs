//! Dual-path key index used by the eviction stores.
//!
//! Each store keeps a [`KeyIndex`] from [`CacheKey`] to its own per-entry
//! payload (a list node pointer, plus a frequency for LFU). Hashable keys
//! resolve through a bucket map keyed by their precomputed 64-bit hash, so
//! lookup is O(1) expected with full-equality confirmation inside the
//! bucket. Structural keys have no hash to bucket by and live in a flat
//! list scanned by equality, O(m) in the number of structural entries.

use hashbrown::HashMap;

use crate::key::{CacheKey, KeyParts};

/// Key to payload mapping with a hashed fast path and a structural slow
/// path.
#[derive(Debug)]
pub(crate) struct KeyIndex<P> {
    hashed: HashMap<u64, Vec<(KeyParts, P)>>,
    structural: Vec<(KeyParts, P)>,
    len: usize,
}

impl<P> KeyIndex<P> {
    pub(crate) fn new() -> Self {
        KeyIndex {
            hashed: HashMap::new(),
            structural: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn get(&self, key: &CacheKey) -> Option<&P> {
        match key {
            CacheKey::Hashable { hash, parts } => self
                .hashed
                .get(hash)?
                .iter()
                .find(|(stored, _)| stored == parts)
                .map(|(_, payload)| payload),
            CacheKey::Structural { parts } => self
                .structural
                .iter()
                .find(|(stored, _)| stored == parts)
                .map(|(_, payload)| payload),
        }
    }

    pub(crate) fn get_mut(&mut self, key: &CacheKey) -> Option<&mut P> {
        match key {
            CacheKey::Hashable { hash, parts } => self
                .hashed
                .get_mut(hash)?
                .iter_mut()
                .find(|(stored, _)| stored == parts)
                .map(|(_, payload)| payload),
            CacheKey::Structural { parts } => self
                .structural
                .iter_mut()
                .find(|(stored, _)| stored == parts)
                .map(|(_, payload)| payload),
        }
    }

    /// Inserts a payload for `key`. The key must not already be present;
    /// stores update payloads in place through [`KeyIndex::get_mut`].
    pub(crate) fn insert(&mut self, key: &CacheKey, payload: P) {
        debug_assert!(self.get(key).is_none(), "key already indexed");
        match key {
            CacheKey::Hashable { hash, parts } => {
                self.hashed
                    .entry(*hash)
                    .or_default()
                    .push((parts.clone(), payload));
            }
            CacheKey::Structural { parts } => {
                self.structural.push((parts.clone(), payload));
            }
        }
        self.len += 1;
    }

    pub(crate) fn remove(&mut self, key: &CacheKey) -> Option<P> {
        let payload = match key {
            CacheKey::Hashable { hash, parts } => {
                let bucket = self.hashed.get_mut(hash)?;
                let pos = bucket.iter().position(|(stored, _)| stored == parts)?;
                let (_, payload) = bucket.swap_remove(pos);
                if bucket.is_empty() {
                    self.hashed.remove(hash);
                }
                payload
            }
            CacheKey::Structural { parts } => {
                let pos = self
                    .structural
                    .iter()
                    .position(|(stored, _)| stored == parts)?;
                self.structural.swap_remove(pos).1
            }
        };
        self.len -= 1;
        Some(payload)
    }

    /// Iterates over every payload, hashed and structural alike. Used by
    /// the stores to sweep expired entries.
    pub(crate) fn payloads(&self) -> impl Iterator<Item = &P> {
        self.hashed
            .values()
            .flat_map(|bucket| bucket.iter())
            .chain(self.structural.iter())
            .map(|(_, payload)| payload)
    }

    pub(crate) fn clear(&mut self) {
        self.hashed.clear();
        self.structural.clear();
        self.len = 0;
    }
}
