//! PostgreSQL storage backend for the Keystone auth service.
//!
//! Provides the connection pool, the [`keystone_core::DataStore`]
//! implementation the health probe and shutdown sequence consume, and the
//! user table operations the startup seeding needs.

pub mod config;
pub mod error;
pub mod pool;
pub mod store;

pub use config::PostgresConfig;
pub use error::{PostgresError, Result};
pub use pool::create_pool;
pub use store::{NewUser, PostgresStore};
