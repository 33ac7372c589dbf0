//! Connection lifecycle state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Disconnected → Connecting           (initialize)
//! Connecting   → Connected            (transport established)
//! Connected    → Ready                (handshake complete)
//! Connecting   → ErroredTransient     (connect failed)
//! Ready        → Disconnected         (transport-level disconnect observed)
//! any state    → Closed               (explicit shutdown, terminal)
//! ```
//!
//! There is no automatic reconnect: `ErroredTransient` persists until a
//! fresh initialize or process restart. All mutations go through one
//! controlled transition path on [`crate::CacheConnection`].

use serde::{Deserialize, Serialize};

/// Lifecycle state of the cache connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection attempt made yet.
    Disconnected,
    /// Asynchronous connect in flight.
    Connecting,
    /// Transport established, handshake pending.
    Connected,
    /// Connection usable for commands.
    Ready,
    /// Connect failed; stays here until shutdown or a fresh initialize.
    ErroredTransient,
    /// Shut down. Terminal.
    Closed,
}

impl ConnectionState {
    /// Whether moving from `self` to `to` is a legal lifecycle transition.
    #[must_use]
    pub fn can_transition_to(self, to: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, to) {
            // Shutdown wins from anywhere, and is idempotent.
            (_, Closed) => true,
            (Disconnected, Connecting) => true,
            (Connecting, Connected) => true,
            (Connected, Ready) => true,
            (Connecting, ErroredTransient) => true,
            (Ready, Disconnected) => true,
            _ => false,
        }
    }

    /// True only in the one state where commands may be issued.
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    /// True once the connection has been shut down.
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Ready => "ready",
            ConnectionState::ErroredTransient => "errored_transient",
            ConnectionState::Closed => "closed",
        };
        write!(f, "{name}")
    }
}
