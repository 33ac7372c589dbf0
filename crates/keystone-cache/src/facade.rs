//! Best-effort operation surface over the cache connection.
//!
//! Every operation is total: transport errors, timeouts and an unready
//! connection all degrade to an absent/false/no-op result with one log
//! record naming the operation kind and key. Values are never logged.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use redis::AsyncCommands;
use tokio::time::timeout;

use crate::connection::CacheConnection;
use crate::error::{CacheError, Result};

/// Kind of a single facade operation, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Get,
    Set,
    Delete,
    Exists,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::Delete => "delete",
            Operation::Exists => "exists",
        };
        write!(f, "{name}")
    }
}

/// Narrow, never-erroring cache surface for request handlers.
///
/// Holds a non-owning reference to the shared [`CacheConnection`]; the
/// facade never mutates connection state and never closes it.
#[derive(Clone)]
pub struct CacheFacade {
    connection: Arc<CacheConnection>,
}

impl CacheFacade {
    /// Creates a facade over the shared connection.
    #[must_use]
    pub fn new(connection: Arc<CacheConnection>) -> Self {
        Self { connection }
    }

    /// Reads a value.
    ///
    /// Returns `None` if the key does not exist OR if the operation fails;
    /// the two are indistinguishable by contract.
    pub async fn get(&self, key: &str) -> Option<String> {
        if !valid_key(Operation::Get, key) {
            return None;
        }
        let mut conn = match self.connection.command_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                log_failure(Operation::Get, key, &e);
                return None;
            }
        };
        match self.bounded(conn.get::<_, Option<String>>(key)).await {
            Ok(value) => value,
            Err(e) => {
                log_failure(Operation::Get, key, &e);
                None
            }
        }
    }

    /// Stores a value, fire-and-forget from the caller's perspective.
    ///
    /// With a TTL greater than zero the store expires the key after that
    /// duration; `None` (or a zero TTL) means no expiration.
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if !valid_key(Operation::Set, key) {
            return;
        }
        let mut conn = match self.connection.command_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                log_failure(Operation::Set, key, &e);
                return;
            }
        };
        let result = match ttl {
            Some(ttl) if ttl.as_secs() > 0 => {
                self.bounded(conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()))
                    .await
            }
            _ => self.bounded(conn.set::<_, _, ()>(key, value)).await,
        };
        if let Err(e) = result {
            log_failure(Operation::Set, key, &e);
        }
    }

    /// Removes a key. No-op if absent; errors are swallowed.
    pub async fn delete(&self, key: &str) {
        if !valid_key(Operation::Delete, key) {
            return;
        }
        let mut conn = match self.connection.command_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                log_failure(Operation::Delete, key, &e);
                return;
            }
        };
        if let Err(e) = self.bounded(conn.del::<_, ()>(key)).await {
            log_failure(Operation::Delete, key, &e);
        }
    }

    /// True iff the key is present.
    ///
    /// Returns `false` both on absence and on any error.
    pub async fn exists(&self, key: &str) -> bool {
        if !valid_key(Operation::Exists, key) {
            return false;
        }
        let mut conn = match self.connection.command_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                log_failure(Operation::Exists, key, &e);
                return false;
            }
        };
        match self.bounded(conn.exists::<_, bool>(key)).await {
            Ok(present) => present,
            Err(e) => {
                log_failure(Operation::Exists, key, &e);
                false
            }
        }
    }

    /// Applies the per-command timeout to a transport future.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T> {
        let limit = self.connection.config().command_timeout();
        match timeout(limit, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Command(e)),
            Err(_) => Err(CacheError::Timeout {
                timeout_ms: self.connection.config().command_timeout_ms,
            }),
        }
    }
}

fn valid_key(operation: Operation, key: &str) -> bool {
    if key.is_empty() {
        tracing::warn!(operation = %operation, "cache operation called with empty key");
        return false;
    }
    true
}

/// One log record per failed operation: kind and key, never the value.
fn log_failure(operation: Operation, key: &str, error: &CacheError) {
    tracing::warn!(
        operation = %operation,
        key = %key,
        error = %error,
        "cache operation failed"
    );
}
