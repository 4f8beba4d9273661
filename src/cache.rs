//! The owning cache handle.
//!
//! [`Cache`] turns [`Settings`] into a store: a single [`Shard`] when one
//! shard is requested, a [`ShardedStore`] otherwise. When the settings ask
//! for a cleanup interval it also owns the background [`Cleaner`], whose
//! lifetime ends with the cache: call [`Cache::shutdown`] or just drop it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Borrow;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Settings;
use crate::storage::{
    Cleaner, CleanerState, Entry, Shard, ShardedStore, Snapshot, StoreError, Sweep,
};

enum Backend<K, V> {
    Single(Shard<K, V>),
    Sharded(ShardedStore<K, V>),
}

impl<K: Hash + Eq, V> Backend<K, V> {
    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        match self {
            Backend::Single(shard) => shard.get(key),
            Backend::Sharded(store) => store.get(key),
        }
    }

    fn fetch<F>(&self, key: K, compute: F) -> Option<V>
    where
        F: FnOnce(&K) -> Option<V>,
        V: Clone,
    {
        match self {
            Backend::Single(shard) => shard.fetch(key, compute),
            Backend::Sharded(store) => store.fetch(key, compute),
        }
    }

    fn set_entry(&self, key: K, value: V, ttl: Option<Duration>) {
        match (self, ttl) {
            (Backend::Single(shard), None) => shard.set(key, value),
            (Backend::Single(shard), Some(ttl)) => shard.set_with_ttl(key, value, ttl),
            (Backend::Sharded(store), None) => store.set(key, value),
            (Backend::Sharded(store), Some(ttl)) => store.set_with_ttl(key, value, ttl),
        }
    }

    fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self {
            Backend::Single(shard) => shard.delete(key),
            Backend::Sharded(store) => store.delete(key),
        }
    }

    fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        match self {
            Backend::Single(shard) => shard.keys(),
            Backend::Sharded(store) => store.keys(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Backend::Single(shard) => shard.len(),
            Backend::Sharded(store) => store.len(),
        }
    }

    fn delete_expired(&self) -> usize {
        match self {
            Backend::Single(shard) => shard.delete_expired(),
            Backend::Sharded(store) => store.delete_expired(),
        }
    }

    fn snapshot(&self) -> Vec<(K, Entry<V>)>
    where
        K: Clone,
        V: Clone,
    {
        match self {
            Backend::Single(shard) => shard.snapshot(),
            Backend::Sharded(store) => store.snapshot(),
        }
    }

    fn restore(&self, entries: Vec<(K, Entry<V>)>) {
        match self {
            Backend::Single(shard) => shard.restore(entries),
            Backend::Sharded(store) => store.restore(entries),
        }
    }
}

impl<K, V> Sweep for Backend<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
{
    fn delete_expired(&self) -> usize {
        Backend::delete_expired(self)
    }
}

/// An expiring key-value cache.
///
/// # Example
///
/// ```
/// use tempokv::{Cache, Settings};
/// use std::time::Duration;
///
/// let cache = Cache::new(Settings::expiring(Duration::from_secs(60)).with_shards(8)).unwrap();
///
/// cache.set("name".to_string(), "Ariz");
/// assert_eq!(cache.get("name"), Some("Ariz"));
///
/// // Read-through population
/// let value = cache.fetch("lang".to_string(), |_| Some("rust"));
/// assert_eq!(value, Some("rust"));
/// ```
pub struct Cache<K, V> {
    backend: Arc<Backend<K, V>>,
    cleaner: Option<Cleaner>,
    settings: Settings,
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shards = match self.backend.as_ref() {
            Backend::Single(_) => 1,
            Backend::Sharded(store) => store.shard_count(),
        };
        f.debug_struct("Cache")
            .field("shards", &shards)
            .field("settings", &self.settings)
            .field("cleaner", &self.cleaner)
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Builds a cache from `settings`.
    ///
    /// If `settings.cleanup_interval` is non-zero a cleaner is started right
    /// away, which requires a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cleaner`] if the cleaner cannot be started.
    pub fn new(settings: Settings) -> Result<Self, StoreError> {
        let shard_count = settings.shard_count();
        let backend = if shard_count > 1 {
            Backend::Sharded(ShardedStore::new(shard_count, settings.default_ttl)?)
        } else {
            Backend::Single(Shard::with_ttl(settings.default_ttl))
        };
        let backend = Arc::new(backend);

        let cleaner = match settings.cleaner_interval() {
            Some(interval) => {
                let mut cleaner = Cleaner::new(interval);
                cleaner.run(Arc::downgrade(&backend))?;
                Some(cleaner)
            }
            None => None,
        };

        Ok(Self {
            backend,
            cleaner,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns true if keys are spread over more than one shard.
    pub fn is_sharded(&self) -> bool {
        matches!(self.backend.as_ref(), Backend::Sharded(_))
    }

    /// Returns the state of the background cleaner, if one was configured.
    pub fn cleaner_state(&self) -> Option<CleanerState> {
        self.cleaner.as_ref().map(Cleaner::state)
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.backend.get(key)
    }

    /// Gets the value for a key, or computes, stores and returns it.
    ///
    /// `compute` runs with the key's shard write-locked and must not call
    /// back into this cache for a key on the same shard. Returning `None`
    /// from `compute` caches nothing.
    pub fn fetch<F>(&self, key: K, compute: F) -> Option<V>
    where
        F: FnOnce(&K) -> Option<V>,
        V: Clone,
    {
        self.backend.fetch(key, compute)
    }

    /// Sets a key-value pair using the default TTL.
    pub fn set(&self, key: K, value: V) {
        self.backend.set_entry(key, value, None)
    }

    /// Sets a key-value pair with an explicit TTL (zero = never expires).
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.backend.set_entry(key, value, Some(ttl))
    }

    /// Sets a key-value pair that never expires.
    pub fn set_forever(&self, key: K, value: V) {
        self.backend.set_entry(key, value, Some(Duration::ZERO))
    }

    /// Deletes a key. Returns `true` if it was present.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.backend.delete(key)
    }

    /// Returns every stored key.
    ///
    /// Expired entries that have not been swept yet are included, so a
    /// listed key may still miss on [`Cache::get`].
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.backend.keys()
    }

    /// Returns the number of stored entries, including unswept expired ones.
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sweeps expired entries now, independently of the cleaner.
    pub fn delete_expired(&self) -> usize {
        self.backend.delete_expired()
    }

    /// Stops the background cleaner.
    ///
    /// A cache without a cleaner shuts down trivially.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cleaner`] if the cleaner was already stopped.
    pub fn shutdown(&mut self) -> Result<(), StoreError> {
        if let Some(cleaner) = self.cleaner.as_mut() {
            cleaner.stop()?;
        }
        Ok(())
    }

    /// Writes a snapshot of every entry to `writer`.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), StoreError>
    where
        K: Clone + Serialize,
        V: Clone + Serialize,
    {
        Snapshot::capture(self.backend.snapshot()).write_to(writer)
    }

    /// Replaces every entry with a snapshot read from `reader`.
    ///
    /// The snapshot is fully decoded before the cache is touched, so on
    /// error the current entries are left as they were.
    pub fn load<R: Read>(&self, reader: R) -> Result<(), StoreError>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let snapshot: Snapshot<K, V> = Snapshot::read_from(reader)?;
        self.backend.restore(snapshot.into_entries());
        Ok(())
    }

    /// Saves a snapshot to `path`, truncating any existing file.
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError>
    where
        K: Clone + Serialize,
        V: Clone + Serialize,
    {
        let path = path.as_ref();
        let snapshot = Snapshot::capture(self.backend.snapshot());

        let mut writer = BufWriter::new(File::create(path)?);
        snapshot.write_to(&mut writer)?;
        writer.flush()?;

        info!(path = %path.display(), entries = snapshot.len(), "Snapshot saved");
        Ok(())
    }

    /// Loads a snapshot from `path`. See [`Cache::load`].
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let path = path.as_ref();
        let snapshot: Snapshot<K, V> = Snapshot::read_from(BufReader::new(File::open(path)?))?;
        let entries = snapshot.len();
        self.backend.restore(snapshot.into_entries());

        info!(path = %path.display(), entries, "Snapshot loaded");
        Ok(())
    }
}
