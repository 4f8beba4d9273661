//! Construction-time cache settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`Cache`](crate::Cache).
///
/// Loaders can deserialize this directly; missing fields fall back to
/// [`Settings::empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// TTL applied by `set` and `fetch` (zero = never expires)
    pub default_ttl: Duration,

    /// Interval between background sweeps (zero = no cleaner)
    pub cleanup_interval: Duration,

    /// Requested number of shards (1 = unsharded)
    pub shards: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::empty()
    }
}

impl Settings {
    /// No expiry, no cleaner, a single shard.
    pub const fn empty() -> Self {
        Self {
            default_ttl: Duration::ZERO,
            cleanup_interval: Duration::ZERO,
            shards: 1,
        }
    }

    /// Entries expire after `ttl`; no cleaner, a single shard.
    pub const fn expiring(ttl: Duration) -> Self {
        Self {
            default_ttl: ttl,
            cleanup_interval: Duration::ZERO,
            shards: 1,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_cleanup(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_shards(mut self, shards: u32) -> Self {
        self.shards = shards;
        self
    }

    /// The shard count actually used: `0` becomes `1`, anything else is
    /// rounded up to the next power of two.
    pub fn shard_count(&self) -> usize {
        (self.shards.max(1) as usize).next_power_of_two()
    }

    /// Returns the cleanup interval if a cleaner should run.
    pub fn cleaner_interval(&self) -> Option<Duration> {
        (!self.cleanup_interval.is_zero()).then_some(self.cleanup_interval)
    }
}
