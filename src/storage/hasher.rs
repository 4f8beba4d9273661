//! Key hashing for shard routing.
//!
//! Any `K: Hash` can be routed; there is no restriction to string keys and
//! no reinterpretation of the key's memory. The default builder is
//! [`RandomState`], which draws a fresh random seed for every store so that
//! two stores (or two runs) never share a collision pattern.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

/// Derives a 64-bit hash from a key with a per-instance seed.
#[derive(Debug, Clone, Default)]
pub struct KeyHasher<S = RandomState> {
    build: S,
}

impl KeyHasher<RandomState> {
    /// Creates a hasher with a freshly randomized seed.
    pub fn new() -> Self {
        Self {
            build: RandomState::new(),
        }
    }
}

impl<S: BuildHasher> KeyHasher<S> {
    /// Creates a hasher from an explicit builder, e.g. a fixed-seed one for
    /// reproducible routing.
    pub fn with_hasher(build: S) -> Self {
        Self { build }
    }

    #[inline]
    pub fn hash<K: Hash + ?Sized>(&self, key: &K) -> u64 {
        self.build.hash_one(key)
    }
}
