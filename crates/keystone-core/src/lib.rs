//! Shared contracts for the Keystone auth service.
//!
//! This crate holds the boundary types the service components agree on:
//!
//! - [`DataStore`]: the narrow contract the health probe and the shutdown
//!   sequence consume from the relational storage backend
//! - [`HealthReport`]: the composite health report returned by the `/health`
//!   endpoint, aggregating the liveness of independent dependencies
//!
//! Keeping these here lets the server wire concrete backends (PostgreSQL,
//! Redis) without the components depending on each other directly.

pub mod datastore;
pub mod health;

pub use datastore::{DataStore, DataStoreError};
pub use health::{ComponentHealth, HealthReport, HealthStatus};
