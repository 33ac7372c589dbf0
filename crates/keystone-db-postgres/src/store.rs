//! Data store implementation over the PostgreSQL pool.
//!
//! Implements the [`DataStore`] boundary contract (liveness round trip and
//! explicit disconnect) plus the user table operations startup seeding
//! depends on.

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_postgres::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use keystone_core::{DataStore, DataStoreError};

use crate::error::Result;

/// A user record to insert during seeding.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// PostgreSQL-backed data store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the users table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'USER',
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("users table ensured");
        Ok(())
    }

    /// Inserts a user unless one with the same email already exists.
    ///
    /// Returns `true` if the user was created, `false` if it already
    /// existed (seeding is idempotent).
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_user_if_absent(&self, user: &NewUser) -> Result<bool> {
        let result = query(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl DataStore for PostgresStore {
    async fn ping(&self) -> std::result::Result<(), DataStoreError> {
        query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DataStoreError::unavailable(e.to_string()))?;
        Ok(())
    }

    async fn disconnect(&self) {
        info!("closing PostgreSQL connection pool");
        self.pool.close().await;
    }
}
