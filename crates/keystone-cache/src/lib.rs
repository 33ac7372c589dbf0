//! Cache connection lifecycle and best-effort facade.
//!
//! ## Architecture
//!
//! - [`CacheConnection`]: owns the single multiplexed Redis connection per
//!   process and tracks its lifecycle as an explicit state machine
//! - [`CacheFacade`]: narrow get/set/delete/exists surface over the
//!   connection that never surfaces transport errors to callers
//!
//! ## Best-Effort Contract
//!
//! The cache is an accelerator, never a source of truth. Every facade
//! operation returns a plain value: `get` answers `None` both for a missing
//! key and for a failed operation, `exists` answers `false` for both. The
//! ambiguity is deliberate and part of the contract — callers must not
//! depend on cache operations succeeding for correctness.
//!
//! ## Graceful Degradation
//!
//! Connection failures are never fatal. A failed connect leaves the
//! connection in a transient error state that is visible to the health
//! probe; facade calls degrade to misses until the process is restarted
//! or the connection is shut down.

pub mod config;
pub mod connection;
pub mod error;
pub mod facade;
pub mod state;

pub use config::CacheConfig;
pub use connection::CacheConnection;
pub use error::CacheError;
pub use facade::CacheFacade;
pub use state::ConnectionState;
