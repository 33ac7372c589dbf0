//! Application configuration.
//!
//! Loaded from an optional TOML file plus `KEYSTONE__`-prefixed environment
//! variable overrides (e.g. `KEYSTONE__SERVER__PORT=3001`,
//! `KEYSTONE__CACHE__PASSWORD=...`). Every section has serde defaults so an
//! empty config is valid for local development.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use keystone_cache::CacheConfig;
use keystone_db_postgres::PostgresConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// PostgreSQL configuration
    #[serde(default)]
    pub postgres: PostgresConfig,
    /// Redis cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Graceful shutdown configuration
    #[serde(default)]
    pub shutdown: ShutdownConfig,
    /// Bootstrap configuration (initial admin and test users)
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err("server.host must be an IP address".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Cache validations
        if self.cache.port == 0 {
            return Err("cache.port must be > 0".into());
        }
        if self.cache.command_timeout_ms == 0 {
            return Err("cache.command_timeout_ms must be > 0".into());
        }
        // Storage validation
        if self.postgres.url.is_empty() {
            return Err("postgres.url must not be empty".into());
        }
        if self.postgres.pool_size == 0 {
            return Err("postgres.pool_size must be > 0".into());
        }
        // Shutdown validation
        if self.shutdown.release_timeout_ms == 0 {
            return Err("shutdown.release_timeout_ms must be > 0".into());
        }
        // Bootstrap validation
        if self.bootstrap.enabled && self.bootstrap.admin_password.is_empty() {
            return Err(
                "bootstrap.enabled=true requires bootstrap.admin_password \
                 (use KEYSTONE__BOOTSTRAP__ADMIN_PASSWORD)"
                    .into(),
            );
        }
        Ok(())
    }

    /// Socket address the HTTP server binds to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        let ip = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.server.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    /// Deployment environment label (e.g. development, staging, production).
    ///
    /// Reported in startup logs; has no behavioral effect.
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_body_limit_bytes() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
            environment: default_environment(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Bounded wait for each resource release during drain, in milliseconds.
    ///
    /// A release exceeding this is abandoned and termination proceeds.
    #[serde(default = "default_release_timeout_ms")]
    pub release_timeout_ms: u64,
}

fn default_release_timeout_ms() -> u64 {
    5000
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            release_timeout_ms: default_release_timeout_ms(),
        }
    }
}

impl ShutdownConfig {
    /// Per-resource release timeout as a [`Duration`].
    #[must_use]
    pub fn release_timeout(&self) -> Duration {
        Duration::from_millis(self.release_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Seed initial users on startup.
    /// Default: false
    #[serde(default)]
    pub enabled: bool,

    /// Admin email address.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Admin password.
    ///
    /// For security, prefer the KEYSTONE__BOOTSTRAP__ADMIN_PASSWORD env var.
    #[serde(default)]
    pub admin_password: String,

    /// Test user email address.
    #[serde(default = "default_test_email")]
    pub test_email: String,

    /// Test user password. Empty means the test user is not seeded.
    #[serde(default)]
    pub test_password: String,
}

fn default_admin_email() -> String {
    "admin@example.com".to_string()
}

fn default_test_email() -> String {
    "test@example.com".to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            admin_email: default_admin_email(),
            admin_password: String::new(),
            test_email: default_test_email(),
            test_password: String::new(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from("keystone.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., KEYSTONE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("KEYSTONE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.addr().port(), 3001);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bootstrap_requires_admin_password() {
        let mut cfg = AppConfig::default();
        cfg.bootstrap.enabled = true;
        assert!(cfg.validate().is_err());

        cfg.bootstrap.admin_password = "changeme".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_default_environment_is_development() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.environment, "development");
    }

    #[test]
    fn test_parses_partial_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            port = 8080
            environment = "production"

            [cache]
            host = "cache.internal"

            [shutdown]
            release_timeout_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.environment, "production");
        assert_eq!(cfg.cache.host, "cache.internal");
        assert_eq!(cfg.cache.port, 6379);
        assert_eq!(cfg.shutdown.release_timeout(), Duration::from_secs(2));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_non_ip_host_rejected() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not-an-ip".into();
        assert!(cfg.validate().is_err());
    }
}
