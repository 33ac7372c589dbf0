//! HTTP server implementation for the Keystone auth service.
//!
//! Wires the cache connection, the PostgreSQL data store, the composite
//! health probe and the shutdown coordinator into an axum application.
//! The process bootstrap in `main.rs` is the single authoritative owner of
//! the shared cache connection: it constructs it once and injects it into
//! the facade and the health aggregator; only the shutdown coordinator
//! releases it.

pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod shutdown;

pub use config::{AppConfig, BootstrapConfig, LoggingConfig, ServerConfig, ShutdownConfig};
pub use health::{HealthAggregator, SERVICE_NAME};
pub use observability::init_tracing;
pub use server::{AppState, KeystoneServer, ServerBuilder, build_app};
pub use shutdown::{ShutdownCoordinator, ShutdownState};
