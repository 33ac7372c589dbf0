use std::{env, sync::Arc};

use keystone_cache::{CacheConnection, CacheFacade};
use keystone_core::DataStore;
use keystone_db_postgres::{PostgresStore, create_pool};
use keystone_server::config::loader::load_config;
use keystone_server::{
    AppState, HealthAggregator, ServerBuilder, ShutdownCoordinator, bootstrap, observability,
};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From KEYSTONE_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (keystone.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (KEYSTONE_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    // This allows environment variables to be set from .env for local development
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    observability::init_tracing();

    // Parse config path from CLI, environment, or use default
    let (config_path, source) = resolve_config_path();

    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = %config_path,
        source = %source,
        environment = %cfg.server.environment,
        "Configuration loaded"
    );

    observability::apply_logging_level(&cfg.logging.level);

    // PostgreSQL is mandatory: the service cannot start without its
    // primary data store.
    let pool = match create_pool(&cfg.postgres).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Database connection failed: {e}");
            std::process::exit(2);
        }
    };
    let store = Arc::new(PostgresStore::new(pool));
    if let Err(e) = store.ensure_schema().await {
        eprintln!("Schema initialization failed: {e}");
        std::process::exit(2);
    }

    // Seeding is best-effort: a failed seed leaves the service usable.
    if cfg.bootstrap.enabled {
        match bootstrap::seed_users(&store, &cfg.bootstrap).await {
            Ok(stats) => {
                tracing::info!(
                    created = stats.created,
                    skipped = stats.skipped,
                    "Bootstrap finished"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bootstrap failed, continuing without seeded users");
            }
        }
    }

    // The cache connects in the background; the service serves traffic
    // (degraded) while Redis is unreachable.
    let cache = Arc::new(CacheConnection::new(cfg.cache.clone()));
    cache.initialize();

    let datastore: Arc<dyn DataStore> = store;
    let health = Arc::new(HealthAggregator::new(
        Arc::clone(&datastore),
        Arc::clone(&cache),
    ));
    let coordinator = Arc::new(ShutdownCoordinator::new(
        datastore,
        Arc::clone(&cache),
        cfg.shutdown.release_timeout(),
    ));

    let state = AppState {
        cache: CacheFacade::new(cache),
        health,
    };

    let server = match ServerBuilder::new(cfg)
        .with_state(state)
        .with_coordinator(coordinator)
        .build()
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Server initialization failed: {e}");
            std::process::exit(2);
        }
    };

    if let Err(err) = server.run().await {
        eprintln!("Server error: {err}");
    }
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: KEYSTONE_CONFIG
/// 3. Default: keystone.toml
fn resolve_config_path() -> (String, ConfigSource) {
    // 1. Check CLI: --config <path>
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    // 2. Check environment variable
    if let Ok(path) = env::var("KEYSTONE_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    // 3. Default to keystone.toml
    ("keystone.toml".to_string(), ConfigSource::Default)
}
