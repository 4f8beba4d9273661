//! Storage Engine Module
//!
//! This module provides the core storage functionality for tempokv: a
//! thread-safe key-value shard with TTL support, a sharded store built from
//! those shards, and a background expiry cleaner.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ShardedStore                            │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...N     │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ delete_expired()
//!              ┌─────────────┴─────────────┐
//!              │         Cleaner           │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: independent shards reduce lock contention
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **TTL Support**: a default TTL per store plus per-call overrides
//! - **Lazy Expiry**: Expired entries are hidden on read
//! - **Active Expiry**: The cleaner reclaims expired entries
//!
//! ## Example
//!
//! ```
//! use tempokv::storage::ShardedStore;
//! use std::time::Duration;
//!
//! let store = ShardedStore::new(8, Duration::from_secs(3600)).unwrap();
//!
//! store.set("name".to_string(), "Ariz".to_string());
//! assert_eq!(store.get("name"), Some("Ariz".to_string()));
//!
//! let value = store.fetch("session".to_string(), |_| Some("token123".to_string()));
//! assert_eq!(value.as_deref(), Some("token123"));
//! ```

pub mod cleaner;
pub mod entry;
pub mod error;
pub mod hasher;
pub mod shard;
pub mod sharded;
pub mod snapshot;

// Re-export commonly used types
pub use cleaner::{Cleaner, CleanerState};
pub use entry::Entry;
pub use error::{CleanerError, StoreError};
pub use hasher::KeyHasher;
pub use shard::Shard;
pub use sharded::ShardedStore;
pub use snapshot::Snapshot;

/// A store that can drop its expired entries.
///
/// This is the only entry point the [`Cleaner`] uses.
pub trait Sweep: Send + Sync {
    /// Removes every expired entry and returns how many were removed.
    fn delete_expired(&self) -> usize;
}
