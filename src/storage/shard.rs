//! Single-shard storage engine.
//!
//! A [`Shard`] is one `HashMap` behind one `RwLock`. It is usable on its own
//! as an unsharded store, and it is the building block of
//! [`ShardedStore`](crate::storage::ShardedStore).
//!
//! ## Expiry
//!
//! Reads apply **lazy expiry**: an entry past its deadline is hidden from
//! [`Shard::get`] but stays in the map, so reads never need the write lock.
//! Expired entries are only reclaimed by [`Shard::delete`] or by a sweep
//! ([`Shard::delete_expired`]), which is what the background
//! [`Cleaner`](crate::storage::Cleaner) calls.
//!
//! One consequence: [`Shard::keys`] and [`Shard::len`] still count entries
//! that have expired but not been swept yet.

use parking_lot::{RwLock, RwLockWriteGuard};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::trace;

use super::entry::Entry;
use super::Sweep;

/// A single partition of the key space with its own lock.
///
/// # Example
///
/// ```
/// use tempokv::storage::Shard;
/// use std::time::Duration;
///
/// let shard = Shard::with_ttl(Duration::from_secs(60));
///
/// shard.set("name", "Ariz");
/// assert_eq!(shard.get("name"), Some("Ariz"));
///
/// let value = shard.fetch("lang", |_| Some("rust"));
/// assert_eq!(value, Some("rust"));
/// ```
pub struct Shard<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    /// TTL applied by `set` and `fetch` (None = entries never expire)
    ttl: Option<Duration>,
}

impl<K, V> fmt::Debug for Shard<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard")
            .field("entries", &self.entries.read().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<K: Hash + Eq, V> Default for Shard<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> Shard<K, V> {
    /// Creates a shard whose entries never expire unless written with an
    /// explicit TTL.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: None,
        }
    }

    /// Creates a shard that applies `ttl` to every `set` and `fetch`.
    ///
    /// A zero TTL is the same as [`Shard::new`].
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: (!ttl.is_zero()).then_some(ttl),
        }
    }

    /// Returns the default TTL policy of this shard.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired
    /// entry is left in place for the next sweep.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let entries = self.entries.read();
        lookup(&entries, key, Instant::now())
    }

    /// Gets the value for a key, computing and storing it on a miss.
    ///
    /// The write lock is held for the whole call, including `compute`, so
    /// concurrent fetches on this shard never compute the same key twice.
    /// `compute` must not call back into this shard.
    ///
    /// If `compute` returns `None` nothing is stored and `None` is returned.
    pub fn fetch<F>(&self, key: K, compute: F) -> Option<V>
    where
        F: FnOnce(&K) -> Option<V>,
        V: Clone,
    {
        let mut entries = self.entries.write();

        if let Some(value) = lookup(&entries, &key, Instant::now()) {
            return Some(value);
        }

        let value = compute(&key)?;
        entries.insert(key, Entry::with_policy(value.clone(), self.ttl));
        Some(value)
    }

    /// Sets a key-value pair using the shard's default TTL.
    ///
    /// If the key already exists, its entry is replaced.
    pub fn set(&self, key: K, value: V) {
        let entry = Entry::with_policy(value, self.ttl);
        self.entries.write().insert(key, entry);
    }

    /// Sets a key-value pair with an explicit TTL (zero = never expires).
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = Entry::with_ttl(value, ttl);
        self.entries.write().insert(key, entry);
    }

    /// Sets a key-value pair that never expires, regardless of the default TTL.
    pub fn set_forever(&self, key: K, value: V) {
        self.entries.write().insert(key, Entry::new(value));
    }

    /// Deletes a key.
    ///
    /// # Returns
    ///
    /// Returns `true` if an entry (expired or not) was removed.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.write().remove(key).is_some()
    }

    /// Returns every stored key, including expired entries that have not
    /// been swept yet.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns the number of stored entries, including unswept expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the shard holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry.
    ///
    /// # Returns
    ///
    /// Returns the number of entries that were removed.
    pub fn delete_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        let now = Instant::now();

        entries.retain(|_, entry| !entry.is_sweepable(now));

        let removed = before - entries.len();
        trace!(removed, remaining = entries.len(), "Shard swept");
        removed
    }

    /// Copies out every entry under the write lock.
    pub fn snapshot(&self) -> Vec<(K, Entry<V>)>
    where
        K: Clone,
        V: Clone,
    {
        let entries = self.entries.write();
        entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Replaces the whole map with `entries`.
    pub fn restore<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Entry<V>)>,
    {
        *self.entries.write() = entries.into_iter().collect();
    }

    /// Locks the shard for a multi-shard restore.
    pub(crate) fn write_lock(&self) -> RwLockWriteGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.write()
    }
}

impl<K, V> Sweep for Shard<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
{
    fn delete_expired(&self) -> usize {
        Shard::delete_expired(self)
    }
}

/// Expiration-aware lookup shared by `get` and `fetch`.
#[inline]
fn lookup<K, Q, V>(entries: &HashMap<K, Entry<V>>, key: &Q, now: Instant) -> Option<V>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    V: Clone,
{
    entries
        .get(key)
        .filter(|entry| entry.is_live(now))
        .map(|entry| entry.value.clone())
}
