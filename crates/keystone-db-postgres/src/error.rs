//! Error types for the PostgreSQL storage backend.

use keystone_core::DataStoreError;
use sqlx_core::error::Error as SqlxError;

/// Errors specific to the PostgreSQL storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] SqlxError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for DataStoreError {
    fn from(err: PostgresError) -> Self {
        DataStoreError::unavailable(err.to_string())
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostgresError::config("invalid URL");
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_conversion_to_datastore_error() {
        let pg_err = PostgresError::config("test error");
        let ds_err: DataStoreError = pg_err.into();
        assert!(matches!(ds_err, DataStoreError::Unavailable { .. }));
    }
}
