//! Error types for the storage layer.

use thiserror::Error;

/// Misuse of a [`Cleaner`](crate::storage::Cleaner)'s lifecycle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanerError {
    #[error("cleaner has already been started")]
    AlreadyStarted,

    #[error("cleaner was never started")]
    NotStarted,

    #[error("cleaner has already been stopped")]
    AlreadyStopped,

    #[error("no tokio runtime is available to run the cleaner")]
    NoRuntime,

    #[error("cleaner interval must be greater than zero")]
    ZeroInterval,
}

/// Errors returned when building, persisting or restoring a store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("shard count must be a non-zero power of two, got {0}")]
    InvalidShardCount(usize),

    #[error("cleaner error: {0}")]
    Cleaner(#[from] CleanerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] Box<bincode::ErrorKind>),
}
