//! Configuration for the cache connection.

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Redis cache connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Redis port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional password.
    ///
    /// For security, prefer the KEYSTONE__CACHE__PASSWORD env var over the
    /// config file.
    #[serde(default)]
    pub password: Option<String>,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Per-command timeout in milliseconds.
    ///
    /// Commands exceeding this are treated as transport failures and
    /// degrade to cache misses.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_command_timeout_ms() -> u64 {
    3000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl CacheConfig {
    /// Creates a configuration for the given host and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Per-command timeout as a [`Duration`].
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Builds the redis connection info.
    ///
    /// Built from structured fields rather than a URL so passwords never
    /// need URL encoding (and never appear in logged URLs).
    #[must_use]
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }

    /// Host and port for logging.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
