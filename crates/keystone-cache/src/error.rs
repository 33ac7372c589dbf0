//! Error types for the cache subsystem.
//!
//! These errors never escape the facade: every failure path terminates in
//! a log record and a degraded result. They exist so the connection and
//! the facade can communicate precisely about what went wrong.

use crate::state::ConnectionState;

/// Errors raised by cache command handling.
///
/// Connect failures are not represented here: they are recorded on the
/// connection itself as its last error and surfaced through the state
/// machine.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The connection is not in the Ready state.
    #[error("cache connection not ready (state: {state})")]
    NotReady { state: ConnectionState },

    /// A command exceeded its bounded timeout.
    #[error("cache command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The transport reported a command failure.
    #[error("cache command error: {0}")]
    Command(#[from] redis::RedisError),
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
