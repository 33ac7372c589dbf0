//! Cache connection lifecycle management.
//!
//! Exactly one [`CacheConnection`] exists per process. It is constructed by
//! the server bootstrap and injected (`Arc`) into the facade and the health
//! probe; only the shutdown coordinator has authority to close it.
//!
//! State is mutated through a single controlled transition path that
//! validates against the lifecycle table in [`crate::state`] and emits one
//! log record per transition.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use redis::aio::MultiplexedConnection;
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::state::ConnectionState;

/// Mutable connection state, guarded by one lock.
struct Inner {
    state: ConnectionState,
    last_error: Option<String>,
    conn: Option<MultiplexedConnection>,
}

/// The single shared Redis connection for the process.
///
/// The multiplexed transport serializes commands at the protocol level, so
/// concurrent request handlers share one connection without explicit
/// locking around commands. Cloning the handle is cheap; each facade call
/// is an independent request/response exchange.
pub struct CacheConnection {
    config: CacheConfig,
    inner: RwLock<Inner>,
    initialized: AtomicBool,
}

impl CacheConnection {
    /// Creates a connection in the `Disconnected` state.
    ///
    /// No network activity happens until [`CacheConnection::initialize`].
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                state: ConnectionState::Disconnected,
                last_error: None,
                conn: None,
            }),
            initialized: AtomicBool::new(false),
        }
    }

    /// Begins the asynchronous connect. Non-blocking.
    ///
    /// Safe to call at most once per process; subsequent calls are logged
    /// and ignored. Connect failures are never fatal: they leave the
    /// connection in `ErroredTransient`, visible to the health probe.
    pub fn initialize(self: &Arc<Self>) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::warn!("cache connection already initialized, ignoring");
            return;
        }

        let connection = Arc::clone(self);
        tokio::spawn(async move {
            connection.connect().await;
        });
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.read().await.state
    }

    /// Last recorded connection error, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    /// True only in the `Ready` state.
    pub async fn is_ready(&self) -> bool {
        self.inner.read().await.state.is_ready()
    }

    /// The configuration this connection was built with.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Liveness round trip (Redis PING) with a bounded timeout.
    ///
    /// Used by the health probe only. A failed ping on a ready connection
    /// is how a transport-level disconnect is observed: the connection
    /// drops back to `Disconnected` and the handle is released.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.command_connection().await?;

        let outcome = timeout(self.config.command_timeout(), async {
            redis::cmd("PING").query_async::<String>(&mut conn).await
        })
        .await;

        match outcome {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                self.record_transport_loss(e.to_string()).await;
                Err(CacheError::Command(e))
            }
            Err(_) => {
                let message = format!(
                    "ping timed out after {}ms",
                    self.config.command_timeout_ms
                );
                self.record_transport_loss(message).await;
                Err(CacheError::Timeout {
                    timeout_ms: self.config.command_timeout_ms,
                })
            }
        }
    }

    /// Shuts the connection down. Idempotent.
    ///
    /// Transitions to `Closed` from any state and releases the transport.
    /// Safe to call even if the connection never reached `Ready`.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.write().await;
        if inner.state.is_closed() {
            tracing::debug!("cache connection already closed");
            return;
        }
        Self::transition(&mut inner, ConnectionState::Closed);
        // Dropping the handle closes the multiplexed transport.
        inner.conn = None;
    }

    /// Clones the command handle if the connection is ready.
    pub(crate) async fn command_connection(&self) -> Result<MultiplexedConnection> {
        let inner = self.inner.read().await;
        match (&inner.conn, inner.state) {
            (Some(conn), state) if state.is_ready() => Ok(conn.clone()),
            (_, state) => Err(CacheError::NotReady { state }),
        }
    }

    /// Establishes the transport. Runs once, spawned from `initialize`.
    async fn connect(&self) {
        {
            let mut inner = self.inner.write().await;
            if inner.state.is_closed() {
                return;
            }
            Self::transition(&mut inner, ConnectionState::Connecting);
        }

        tracing::info!(endpoint = %self.config.endpoint(), "connecting to cache");

        let client = match redis::Client::open(self.config.connection_info()) {
            Ok(client) => client,
            Err(e) => {
                self.record_connect_failure(e.to_string()).await;
                return;
            }
        };

        let connect = client.get_multiplexed_async_connection();
        match timeout(self.config.connect_timeout(), connect).await {
            Ok(Ok(conn)) => {
                let mut inner = self.inner.write().await;
                if inner.state.is_closed() {
                    // Shutdown raced the connect; drop the fresh transport.
                    return;
                }
                Self::transition(&mut inner, ConnectionState::Connected);
                Self::transition(&mut inner, ConnectionState::Ready);
                inner.conn = Some(conn);
                inner.last_error = None;
            }
            Ok(Err(e)) => self.record_connect_failure(e.to_string()).await,
            Err(_) => {
                self.record_connect_failure(format!(
                    "connect timed out after {}ms",
                    self.config.connect_timeout_ms
                ))
                .await;
            }
        }
    }

    /// Records a failed connect: `Connecting -> ErroredTransient`.
    async fn record_connect_failure(&self, message: String) {
        let mut inner = self.inner.write().await;
        if inner.state.is_closed() {
            return;
        }
        tracing::error!(
            endpoint = %self.config.endpoint(),
            error = %message,
            "cache connect failed"
        );
        Self::transition(&mut inner, ConnectionState::ErroredTransient);
        inner.last_error = Some(message);
    }

    /// Records an observed transport loss: `Ready -> Disconnected`.
    async fn record_transport_loss(&self, message: String) {
        let mut inner = self.inner.write().await;
        if !inner.state.is_ready() {
            return;
        }
        tracing::warn!(
            endpoint = %self.config.endpoint(),
            error = %message,
            "cache transport lost"
        );
        Self::transition(&mut inner, ConnectionState::Disconnected);
        inner.last_error = Some(message);
        inner.conn = None;
    }

    /// The one mutation path for lifecycle state.
    fn transition(inner: &mut Inner, to: ConnectionState) {
        let from = inner.state;
        if from == to {
            return;
        }
        if !from.can_transition_to(to) {
            tracing::warn!(from = %from, to = %to, "invalid cache state transition, ignoring");
            return;
        }
        inner.state = to;
        tracing::info!(from = %from, to = %to, "cache connection state changed");
    }
}
