//! Data store boundary contract.
//!
//! The service core only depends on two operations from the relational
//! backend: a trivial liveness round trip and an explicit disconnect used
//! during coordinated shutdown. Everything else (queries, user records)
//! stays behind the concrete backend crate.

use async_trait::async_trait;

/// Errors surfaced by the data store boundary.
#[derive(Debug, thiserror::Error)]
pub enum DataStoreError {
    /// The store did not answer the liveness round trip.
    #[error("data store unavailable: {message}")]
    Unavailable { message: String },
}

impl DataStoreError {
    /// Creates a new unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Minimal contract the core consumes from the relational store.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Executes a no-op query against the store.
    ///
    /// Used exclusively by the health probe; must not perform business work.
    async fn ping(&self) -> Result<(), DataStoreError>;

    /// Releases the underlying connections.
    ///
    /// Called once during coordinated shutdown. Must be safe to call even
    /// if the store was never reachable.
    async fn disconnect(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_error_display() {
        let err = DataStoreError::unavailable("connection refused");
        assert!(err.to_string().contains("connection refused"));
    }
}
