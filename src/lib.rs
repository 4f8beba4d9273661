//! # tempokv - An In-Process Expiring Key-Value Cache
//!
//! tempokv is a generic, thread-safe key-value store with per-entry
//! time-to-live, optional sharding for concurrent throughput, and a
//! background cleaner that reclaims expired entries.
//!
//! ## Features
//!
//! - **Generic**: any `K: Hash + Eq` key, any value type
//! - **High Performance**: Sharded storage with one RwLock per shard
//! - **TTL Support**: a default TTL per cache, per-call overrides
//! - **Read-Through**: `fetch` computes and stores missing values
//! - **Snapshots**: save and load the whole cache with bincode
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Cache                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │  Settings   │───>│        Shard  or  ShardedStore               │   │
//! │  │             │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  └─────────────┘    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │                     │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! │                                               ▲                         │
//! │                                               │ Weak                    │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │              Cleaner                            │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use tempokv::{Cache, Settings};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tempokv::StoreError> {
//!     let settings = Settings::expiring(Duration::from_secs(300))
//!         .with_cleanup(Duration::from_secs(60))
//!         .with_shards(16);
//!
//!     let mut cache = Cache::new(settings)?;
//!
//!     cache.set(42u64, "answer".to_string());
//!     assert_eq!(cache.get(&42), Some("answer".to_string()));
//!
//!     let user = cache.fetch(7, |id| Some(format!("user-{}", id)));
//!     assert_eq!(user.as_deref(), Some("user-7"));
//!
//!     cache.shutdown()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`cache`]: the owning [`Cache`] handle
//! - [`config`]: construction-time [`Settings`]
//! - [`storage`]: shards, the sharded store, the cleaner and snapshots
//!
//! ## Design Highlights
//!
//! ### Lazy + Active Expiry
//!
//! Entries with a TTL are expired in two ways:
//! 1. **Lazy**: reads hide an expired entry but leave it in place
//! 2. **Active**: the cleaner periodically removes expired entries
//!
//! Between the two, an expired entry is still listed by `keys()` and
//! counted by `len()` even though `get()` misses.
//!
//! ### Fetch Locking
//!
//! `fetch` holds its shard's write lock while the compute function runs.
//! Two threads fetching the same missing key never both compute it, but
//! other keys on that shard wait too. Keep compute functions short and never
//! call back into the same cache from inside one.

pub mod cache;
pub mod config;
pub mod storage;

// Re-export commonly used types for convenience
pub use cache::Cache;
pub use config::Settings;
pub use storage::{
    Cleaner, CleanerError, CleanerState, Entry, KeyHasher, Shard, ShardedStore, StoreError, Sweep,
};

/// Version of tempokv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
