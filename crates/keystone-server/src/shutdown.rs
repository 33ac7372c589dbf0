//! Coordinated graceful shutdown.
//!
//! ## State Machine
//!
//! ```text
//! Running → Draining    (first termination signal)
//! Draining → Terminated (owned resources released, or release timeouts)
//! ```
//!
//! The coordinator is the only component with authority to destroy the
//! shared cache connection and the data store pool. Releases are
//! best-effort: each one runs under a bounded timeout and failures are
//! logged, never escalated — the process always reaches `Terminated` and
//! exits cleanly. A second signal while draining is ignored, so resources
//! are released exactly once.

use std::sync::Arc;
use std::time::Duration;

use keystone_cache::CacheConnection;
use keystone_core::DataStore;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Lifecycle state of the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Serving traffic.
    Running,
    /// Releasing owned resources.
    Draining,
    /// All releases attempted. Terminal.
    Terminated,
}

impl std::fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShutdownState::Running => "running",
            ShutdownState::Draining => "draining",
            ShutdownState::Terminated => "terminated",
        };
        write!(f, "{name}")
    }
}

/// Releases owned resources exactly once on termination.
pub struct ShutdownCoordinator {
    state: Mutex<ShutdownState>,
    datastore: Arc<dyn DataStore>,
    cache: Arc<CacheConnection>,
    release_timeout: Duration,
}

impl ShutdownCoordinator {
    /// Creates a coordinator owning the release of both resources.
    #[must_use]
    pub fn new(
        datastore: Arc<dyn DataStore>,
        cache: Arc<CacheConnection>,
        release_timeout: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(ShutdownState::Running),
            datastore,
            cache,
            release_timeout,
        }
    }

    /// Current state of the shutdown sequence.
    pub async fn state(&self) -> ShutdownState {
        *self.state.lock().await
    }

    /// Runs the drain sequence. Idempotent.
    ///
    /// Releases the data store first, then the cache connection, each
    /// under the bounded release timeout. Re-entrant calls while draining
    /// (or after termination) return immediately without duplicating
    /// releases.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock().await;
            if *state != ShutdownState::Running {
                tracing::debug!(state = %*state, "shutdown already in progress, ignoring");
                return;
            }
            *state = ShutdownState::Draining;
        }

        tracing::info!("draining: releasing owned resources");

        if timeout(self.release_timeout, self.datastore.disconnect())
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_ms = self.release_timeout.as_millis() as u64,
                "data store release timed out, proceeding"
            );
        }

        if timeout(self.release_timeout, self.cache.shutdown())
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_ms = self.release_timeout.as_millis() as u64,
                "cache release timed out, proceeding"
            );
        }

        *self.state.lock().await = ShutdownState::Terminated;
        tracing::info!("shutdown complete");
    }

    /// Waits for a termination signal (SIGTERM or SIGINT).
    pub async fn wait_for_signal() {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("SIGINT received, shutting down");
                        }
                        _ = term.recv() => {
                            tracing::info!("SIGTERM received, shutting down");
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to install SIGTERM handler");
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("SIGINT received, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keystone_cache::{CacheConfig, ConnectionState};
    use keystone_core::DataStoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts releases so re-entrancy can be verified.
    struct CountingStore {
        disconnects: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                disconnects: AtomicUsize::new(0),
            })
        }

        fn disconnect_count(&self) -> usize {
            self.disconnects.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataStore for CountingStore {
        async fn ping(&self) -> Result<(), DataStoreError> {
            Ok(())
        }

        async fn disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A store whose release never completes within any bounded wait.
    struct HangingStore;

    #[async_trait]
    impl DataStore for HangingStore {
        async fn ping(&self) -> Result<(), DataStoreError> {
            Ok(())
        }

        async fn disconnect(&self) {
            std::future::pending::<()>().await;
        }
    }

    fn cache() -> Arc<CacheConnection> {
        Arc::new(CacheConnection::new(CacheConfig::default()))
    }

    #[tokio::test]
    async fn test_shutdown_releases_both_resources() {
        let store = CountingStore::new();
        let cache = cache();
        let coordinator = ShutdownCoordinator::new(
            Arc::clone(&store) as Arc<dyn DataStore>,
            Arc::clone(&cache),
            Duration::from_secs(5),
        );

        assert_eq!(coordinator.state().await, ShutdownState::Running);
        coordinator.shutdown().await;

        assert_eq!(coordinator.state().await, ShutdownState::Terminated);
        assert_eq!(store.disconnect_count(), 1);
        assert_eq!(cache.state().await, ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_double_shutdown_releases_exactly_once() {
        let store = CountingStore::new();
        let coordinator = ShutdownCoordinator::new(
            Arc::clone(&store) as Arc<dyn DataStore>,
            cache(),
            Duration::from_secs(5),
        );

        coordinator.shutdown().await;
        coordinator.shutdown().await;

        assert_eq!(store.disconnect_count(), 1);
        assert_eq!(coordinator.state().await, ShutdownState::Terminated);
    }

    #[tokio::test]
    async fn test_concurrent_signals_release_exactly_once() {
        let store = CountingStore::new();
        let coordinator = Arc::new(ShutdownCoordinator::new(
            Arc::clone(&store) as Arc<dyn DataStore>,
            cache(),
            Duration::from_secs(5),
        ));

        let first = Arc::clone(&coordinator);
        let second = Arc::clone(&coordinator);
        tokio::join!(first.shutdown(), second.shutdown());

        assert_eq!(store.disconnect_count(), 1);
        assert_eq!(coordinator.state().await, ShutdownState::Terminated);
    }

    #[tokio::test]
    async fn test_hanging_release_does_not_block_termination() {
        let cache = cache();
        let coordinator = ShutdownCoordinator::new(
            Arc::new(HangingStore),
            Arc::clone(&cache),
            Duration::from_millis(50),
        );

        coordinator.shutdown().await;

        // Termination proceeds despite the abandoned release, and the
        // cache is still shut down afterwards.
        assert_eq!(coordinator.state().await, ShutdownState::Terminated);
        assert_eq!(cache.state().await, ConnectionState::Closed);
    }
}
