//! Sharded storage.
//!
//! Keys are distributed across a fixed, power-of-two number of
//! [`Shard`]s by hashing. This allows multiple threads to read/write
//! different keys concurrently.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ShardedStore                            │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! │        ▲ hash(key) & (N - 1)                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whole-store operations ([`ShardedStore::keys`],
//! [`ShardedStore::delete_expired`]) visit shards one at a time and are
//! not atomic across shards.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::time::Duration;
use tracing::trace;

use super::entry::Entry;
use super::error::StoreError;
use super::hasher::KeyHasher;
use super::shard::Shard;
use super::Sweep;

/// A store partitioned into independently locked shards.
///
/// # Example
///
/// ```
/// use tempokv::storage::ShardedStore;
/// use std::time::Duration;
///
/// let store = ShardedStore::new(16, Duration::ZERO).unwrap();
///
/// store.set(1u64, "one");
/// assert_eq!(store.get(&1), Some("one"));
/// assert_eq!(store.shard_count(), 16);
/// ```
pub struct ShardedStore<K, V, S = RandomState> {
    shards: Box<[Shard<K, V>]>,
    hasher: KeyHasher<S>,
    mask: u64,
}

impl<K, V, S> fmt::Debug for ShardedStore<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedStore")
            .field("shards", &self.shards.len())
            .finish()
    }
}

impl<K, V, S> ShardedStore<K, V, S> {
    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

impl<K: Hash + Eq, V> ShardedStore<K, V, RandomState> {
    /// Creates a store with `shard_count` shards and a randomly seeded hasher.
    ///
    /// `ttl` is the default TTL applied by `set` and `fetch`; zero means
    /// entries never expire.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidShardCount`] unless `shard_count` is a
    /// non-zero power of two.
    pub fn new(shard_count: usize, ttl: Duration) -> Result<Self, StoreError> {
        Self::with_hasher(shard_count, ttl, RandomState::new())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ShardedStore<K, V, S> {
    /// Creates a store that routes keys with the given hash builder.
    pub fn with_hasher(shard_count: usize, ttl: Duration, build: S) -> Result<Self, StoreError> {
        if !shard_count.is_power_of_two() {
            return Err(StoreError::InvalidShardCount(shard_count));
        }

        let shards = (0..shard_count).map(|_| Shard::with_ttl(ttl)).collect();

        Ok(Self {
            shards,
            hasher: KeyHasher::with_hasher(build),
            mask: shard_count as u64 - 1,
        })
    }

    /// Determines which shard a key belongs to.
    #[inline]
    pub fn shard_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        (self.hasher.hash(key) & self.mask) as usize
    }

    /// Gets the shard for a given key.
    #[inline]
    pub fn shard_for<Q>(&self, key: &Q) -> &Shard<K, V>
    where
        Q: Hash + ?Sized,
    {
        &self.shards[self.shard_index(key)]
    }

    /// Gets the value for a key. See [`Shard::get`].
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.shard_for(key).get(key)
    }

    /// Gets the value for a key, computing it on a miss. See [`Shard::fetch`].
    ///
    /// Only the key's own shard is locked while `compute` runs.
    pub fn fetch<F>(&self, key: K, compute: F) -> Option<V>
    where
        F: FnOnce(&K) -> Option<V>,
        V: Clone,
    {
        self.shard_for(&key).fetch(key, compute)
    }

    pub fn set(&self, key: K, value: V) {
        self.shard_for(&key).set(key, value)
    }

    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.shard_for(&key).set_with_ttl(key, value, ttl)
    }

    pub fn set_forever(&self, key: K, value: V) {
        self.shard_for(&key).set_forever(key, value)
    }

    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shard_for(key).delete(key)
    }

    /// Returns every stored key, shard by shard.
    ///
    /// Like [`Shard::keys`], expired entries that have not been swept are
    /// included.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            keys.extend(shard.keys());
        }
        keys
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Sweeps every shard in turn.
    ///
    /// # Returns
    ///
    /// Returns the total number of entries removed.
    pub fn delete_expired(&self) -> usize {
        let removed: usize = self.shards.iter().map(Shard::delete_expired).sum();
        trace!(removed, shards = self.shards.len(), "Store swept");
        removed
    }

    /// Copies out every entry, shard by shard.
    pub fn snapshot(&self) -> Vec<(K, Entry<V>)>
    where
        K: Clone,
        V: Clone,
    {
        self.shards.iter().flat_map(Shard::snapshot).collect()
    }

    /// Replaces the contents of every shard with `entries`.
    ///
    /// All shard locks are taken (in shard order) before anything is
    /// replaced, and every entry is routed through this store's hasher.
    pub fn restore<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Entry<V>)>,
    {
        let mut guards: Vec<_> = self.shards.iter().map(Shard::write_lock).collect();
        for guard in guards.iter_mut() {
            guard.clear();
        }
        for (key, entry) in entries {
            let index = self.shard_index(&key);
            guards[index].insert(key, entry);
        }
    }
}

impl<K, V, S> Sweep for ShardedStore<K, V, S>
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn delete_expired(&self) -> usize {
        ShardedStore::delete_expired(self)
    }
}
