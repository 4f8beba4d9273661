//! Background Expiry Cleaner
//!
//! This module implements a background task that periodically sweeps a
//! store for expired entries and removes them. This is "active expiry", as
//! opposed to the "lazy expiry" reads perform, which only hides an expired
//! entry without freeing it.
//!
//! ## Why Do We Need This?
//!
//! If an entry expires and is never touched again, lazy expiry alone would
//! keep it in memory forever. The cleaner reclaims those entries.
//!
//! ## Lifecycle
//!
//! ```text
//!   Idle ──run()──> Running ──stop()──> Stopped
//! ```
//!
//! The cleaner runs as a Tokio task and:
//! 1. Sleeps for the configured interval
//! 2. Wakes up and calls [`Sweep::delete_expired`] on its store
//! 3. Exits on the stop signal, or once the store has been dropped
//!
//! The task only holds a [`Weak`] reference to its store, so a running
//! cleaner never keeps the store alive. Dropping a running cleaner stops it.

use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::error::CleanerError;
use super::Sweep;

/// Lifecycle state of a [`Cleaner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanerState {
    Idle,
    Running,
    Stopped,
}

/// A handle to a periodic expiry sweep.
///
/// # Example
///
/// ```
/// use tempokv::storage::{Cleaner, Shard};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), tempokv::storage::CleanerError> {
/// let shard: Arc<Shard<String, String>> = Arc::new(Shard::with_ttl(Duration::from_secs(1)));
///
/// let mut cleaner = Cleaner::new(Duration::from_millis(100));
/// cleaner.run(Arc::downgrade(&shard))?;
///
/// // Cleaner sweeps in the background...
///
/// cleaner.stop()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Cleaner {
    interval: Duration,
    state: CleanerState,
    /// Sender to signal shutdown
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Cleaner {
    /// Creates an idle cleaner that will sweep every `interval` once started.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: CleanerState::Idle,
            shutdown_tx: None,
            task: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> CleanerState {
        self.state
    }

    /// Starts sweeping `store` on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`CleanerError::AlreadyStarted`] if the cleaner is running or stopped
    /// - [`CleanerError::ZeroInterval`] if the interval is zero
    /// - [`CleanerError::NoRuntime`] if called outside a Tokio runtime
    pub fn run<S>(&mut self, store: Weak<S>) -> Result<(), CleanerError>
    where
        S: Sweep + 'static,
    {
        if self.state != CleanerState::Idle {
            debug!(state = ?self.state, "Cleaner start rejected");
            return Err(CleanerError::AlreadyStarted);
        }

        if self.interval.is_zero() {
            return Err(CleanerError::ZeroInterval);
        }

        let runtime = Handle::try_current().map_err(|_| CleanerError::NoRuntime)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        self.task = Some(runtime.spawn(cleaner_loop(store, self.interval, shutdown_rx)));
        self.shutdown_tx = Some(shutdown_tx);
        self.state = CleanerState::Running;

        info!(
            interval_ms = self.interval.as_millis(),
            "Background expiry cleaner started"
        );
        Ok(())
    }

    /// Stops the cleaner.
    ///
    /// A sweep already in progress finishes first; no new sweep starts.
    ///
    /// # Errors
    ///
    /// - [`CleanerError::NotStarted`] if the cleaner was never started
    /// - [`CleanerError::AlreadyStopped`] on a second call
    pub fn stop(&mut self) -> Result<(), CleanerError> {
        match self.state {
            CleanerState::Idle => return Err(CleanerError::NotStarted),
            CleanerState::Stopped => return Err(CleanerError::AlreadyStopped),
            CleanerState::Running => {}
        }

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // The task may already have exited because its store is gone.
            let _ = shutdown_tx.send(true);
        }
        self.state = CleanerState::Stopped;

        info!("Background expiry cleaner stopped");
        Ok(())
    }

    /// Returns `true` once the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(JoinHandle::is_finished).unwrap_or(true)
    }
}

impl Drop for Cleaner {
    fn drop(&mut self) {
        if self.state == CleanerState::Running {
            let _ = self.stop();
        }
    }
}

/// The main cleaner loop.
async fn cleaner_loop<S>(store: Weak<S>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>)
where
    S: Sweep,
{
    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry cleaner received shutdown signal");
                    return;
                }
            }
        }

        let Some(store) = store.upgrade() else {
            debug!("Store dropped, expiry cleaner exiting");
            return;
        };

        let expired = store.delete_expired();
        if expired > 0 {
            debug!(expired, "Expired entries cleaned up");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Shard, ShardedStore};
    use std::sync::Arc;

    fn fast_cleaner() -> Cleaner {
        Cleaner::new(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_cleaner_removes_expired_entries() {
        let shard = Arc::new(Shard::new());

        // Add some keys with short TTL
        for i in 0..10 {
            shard.set_with_ttl(format!("key{}", i), "value", Duration::from_millis(50));
        }

        // Add a persistent key
        shard.set("persistent".to_string(), "value");

        assert_eq!(shard.len(), 11);

        let mut cleaner = fast_cleaner();
        cleaner.run(Arc::downgrade(&shard)).unwrap();
        assert_eq!(cleaner.state(), CleanerState::Running);

        // Wait for keys to expire and be cleaned up
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Only the persistent key should remain
        assert_eq!(shard.len(), 1);
        assert_eq!(shard.get("persistent"), Some("value"));

        cleaner.stop().unwrap();
    }

    #[tokio::test]
    async fn test_cleaner_sweeps_sharded_store() {
        let store = Arc::new(ShardedStore::new(8, Duration::from_millis(20)).unwrap());
        for i in 0..100u32 {
            store.set(i, i);
        }

        let mut cleaner = fast_cleaner();
        cleaner.run(Arc::downgrade(&store)).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(store.is_empty());
        cleaner.stop().unwrap();
    }

    #[tokio::test]
    async fn test_stop_ends_sweeping() {
        let shard = Arc::new(Shard::new());

        let mut cleaner = fast_cleaner();
        cleaner.run(Arc::downgrade(&shard)).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        cleaner.stop().unwrap();
        assert_eq!(cleaner.state(), CleanerState::Stopped);

        // Add keys after the cleaner is stopped
        shard.set_with_ttl("key", "value", Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(100)).await;

        // Nothing swept it, lazy expiry only hides it
        assert!(cleaner.is_finished());
        assert_eq!(shard.len(), 1);
        assert_eq!(shard.get("key"), None);
    }

    #[tokio::test]
    async fn test_cleaner_stops_on_drop() {
        let shard = Arc::new(Shard::new());

        {
            let mut cleaner = fast_cleaner();
            cleaner.run(Arc::downgrade(&shard)).unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            // Cleaner is dropped here
        }

        shard.set_with_ttl("key", "value", Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(shard.len(), 1);
    }

    #[tokio::test]
    async fn test_cleaner_exits_when_store_dropped() {
        let shard: Arc<Shard<String, String>> = Arc::new(Shard::new());

        let mut cleaner = fast_cleaner();
        cleaner.run(Arc::downgrade(&shard)).unwrap();
        drop(shard);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cleaner.is_finished());

        // Still a valid, single stop
        assert_eq!(cleaner.stop(), Ok(()));
    }

    #[tokio::test]
    async fn test_lifecycle_misuse_is_an_error() {
        let shard: Arc<Shard<String, String>> = Arc::new(Shard::new());
        let mut cleaner = fast_cleaner();

        assert_eq!(cleaner.state(), CleanerState::Idle);
        assert_eq!(cleaner.stop(), Err(CleanerError::NotStarted));

        cleaner.run(Arc::downgrade(&shard)).unwrap();
        assert_eq!(
            cleaner.run(Arc::downgrade(&shard)),
            Err(CleanerError::AlreadyStarted)
        );

        assert_eq!(cleaner.stop(), Ok(()));
        assert_eq!(cleaner.stop(), Err(CleanerError::AlreadyStopped));
        assert_eq!(
            cleaner.run(Arc::downgrade(&shard)),
            Err(CleanerError::AlreadyStarted)
        );
    }

    #[test]
    fn test_run_without_runtime() {
        let shard: Arc<Shard<String, String>> = Arc::new(Shard::new());
        let mut cleaner = fast_cleaner();

        assert_eq!(
            cleaner.run(Arc::downgrade(&shard)),
            Err(CleanerError::NoRuntime)
        );
        assert_eq!(cleaner.state(), CleanerState::Idle);
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let shard: Arc<Shard<String, String>> = Arc::new(Shard::new());
        let mut cleaner = Cleaner::new(Duration::ZERO);

        assert_eq!(
            cleaner.run(Arc::downgrade(&shard)),
            Err(CleanerError::ZeroInterval)
        );
        assert_eq!(cleaner.state(), CleanerState::Idle);
        assert_eq!(cleaner.stop(), Err(CleanerError::NotStarted));
    }
}
