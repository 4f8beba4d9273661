//! Serialized form of a store's entries.
//!
//! Monotonic [`Instant`]s mean nothing outside the process that created
//! them, so expiry deadlines are written as wall-clock milliseconds since
//! the Unix epoch and converted back relative to "now" on load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::entry::Entry;
use super::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SnapshotEntry<V> {
    value: V,
    expires_at_ms: Option<u64>,
}

/// A point-in-time copy of a store's entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<K, V> {
    entries: Vec<(K, SnapshotEntry<V>)>,
}

impl<K, V> Snapshot<K, V> {
    /// Builds a snapshot from entries copied out of a store.
    pub fn capture(entries: Vec<(K, Entry<V>)>) -> Self {
        let clock = Clock::now();
        let entries = entries
            .into_iter()
            .map(|(key, entry)| {
                let expires_at_ms = entry.expires_at.map(|exp| clock.to_unix_ms(exp));
                (
                    key,
                    SnapshotEntry {
                        value: entry.value,
                        expires_at_ms,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Converts back into store entries with deadlines relative to now.
    ///
    /// Entries whose deadline already passed come back expired; they are
    /// hidden from reads and removed by the next sweep. A deadline too far
    /// ahead to represent comes back as never expiring.
    pub fn into_entries(self) -> Vec<(K, Entry<V>)> {
        let clock = Clock::now();
        self.entries
            .into_iter()
            .map(|(key, entry)| {
                let expires_at = entry.expires_at_ms.and_then(|ms| clock.to_instant(ms));
                (
                    key,
                    Entry {
                        value: entry.value,
                        expires_at,
                    },
                )
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the snapshot with bincode.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), StoreError>
    where
        K: Serialize,
        V: Serialize,
    {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Decodes a snapshot written by [`Snapshot::write_to`].
    pub fn read_from<R: Read>(reader: R) -> Result<Self, StoreError>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        Ok(bincode::deserialize_from(reader)?)
    }
}

/// A paired reading of the monotonic and wall clocks.
struct Clock {
    instant: Instant,
    wall: SystemTime,
}

impl Clock {
    fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: SystemTime::now(),
        }
    }

    fn to_unix_ms(&self, deadline: Instant) -> u64 {
        let wall = if deadline >= self.instant {
            self.wall.checked_add(deadline - self.instant)
        } else {
            Some(
                self.wall
                    .checked_sub(self.instant - deadline)
                    .unwrap_or(UNIX_EPOCH),
            )
        };
        match wall {
            Some(wall) => {
                let ms = wall.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
                u64::try_from(ms).unwrap_or(u64::MAX)
            }
            None => u64::MAX,
        }
    }

    fn to_instant(&self, unix_ms: u64) -> Option<Instant> {
        let wall = UNIX_EPOCH.checked_add(Duration::from_millis(unix_ms))?;
        match wall.duration_since(self.wall) {
            Ok(ahead) => self.instant.checked_add(ahead),
            Err(behind) => Some(
                self.instant
                    .checked_sub(behind.duration())
                    .unwrap_or(self.instant),
            ),
        }
    }
}
