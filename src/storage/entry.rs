//! Stored values and their expiry.

use std::time::{Duration, Instant};

/// Represents a stored value with optional expiry time.
///
/// Entries are never mutated in place: writing a key replaces its entry
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    /// The actual value stored
    pub value: V,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    /// Creates a new entry without expiry.
    pub fn new(value: V) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates a new entry with TTL.
    ///
    /// A zero TTL means the entry never expires, and so does a TTL too large
    /// to represent as a deadline (e.g. `Duration::MAX`).
    pub fn with_ttl(value: V, ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Self::new(value);
        }
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    /// Creates an entry from an optional TTL policy.
    pub(crate) fn with_policy(value: V, ttl: Option<Duration>) -> Self {
        match ttl {
            Some(ttl) => Self::with_ttl(value, ttl),
            None => Self::new(value),
        }
    }

    /// Returns `true` while the entry may still be served to readers.
    #[inline]
    pub fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now < exp).unwrap_or(true)
    }

    /// Returns `true` once a sweep is allowed to remove the entry.
    ///
    /// Strictly later than the expiry instant, so an entry exactly at its
    /// deadline is hidden from readers but not yet swept.
    #[inline]
    pub fn is_sweepable(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| exp < now).unwrap_or(false)
    }

    /// Returns the remaining TTL, or None if no expiry.
    pub fn ttl(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }
}
