//! Composite health probing.
//!
//! The aggregator holds non-owning references to the data store boundary
//! and the shared cache connection. `probe` runs a liveness round trip
//! against each and folds the results into one [`HealthReport`]; a failed
//! probe of one component never prevents the other from being reported
//! (independent failure isolation).

use std::sync::Arc;

use keystone_cache::CacheConnection;
use keystone_core::{ComponentHealth, DataStore, HealthReport};

/// Service name reported in health payloads and the root endpoint.
pub const SERVICE_NAME: &str = "keystone-auth";

/// Probes the data store and the cache connection on demand.
pub struct HealthAggregator {
    datastore: Arc<dyn DataStore>,
    cache: Arc<CacheConnection>,
}

impl HealthAggregator {
    /// Creates an aggregator over the injected collaborators.
    #[must_use]
    pub fn new(datastore: Arc<dyn DataStore>, cache: Arc<CacheConnection>) -> Self {
        Self { datastore, cache }
    }

    /// Produces a point-in-time composite report. Never fails.
    ///
    /// Each probe failure is captured as `connected: false` for that
    /// component; the report is constructed fresh on every call and never
    /// cached.
    pub async fn probe(&self) -> HealthReport {
        let database = match self.datastore.ping().await {
            Ok(()) => ComponentHealth::connected(),
            Err(e) => {
                tracing::debug!(component = "database", error = %e, "health probe failed");
                ComponentHealth::disconnected()
            }
        };

        let cache = if self.cache.is_ready().await {
            match self.cache.ping().await {
                Ok(()) => ComponentHealth::connected(),
                Err(e) => {
                    tracing::debug!(component = "cache", error = %e, "health probe failed");
                    ComponentHealth::disconnected()
                }
            }
        } else {
            ComponentHealth::disconnected()
        };

        HealthReport::new(SERVICE_NAME, [("database", database), ("cache", cache)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keystone_cache::{CacheConfig, ConnectionState};
    use keystone_core::DataStoreError;

    struct HealthyStore;

    #[async_trait]
    impl DataStore for HealthyStore {
        async fn ping(&self) -> Result<(), DataStoreError> {
            Ok(())
        }
        async fn disconnect(&self) {}
    }

    struct FailingStore;

    #[async_trait]
    impl DataStore for FailingStore {
        async fn ping(&self) -> Result<(), DataStoreError> {
            Err(DataStoreError::unavailable("connection refused"))
        }
        async fn disconnect(&self) {}
    }

    fn unready_cache() -> Arc<CacheConnection> {
        Arc::new(CacheConnection::new(CacheConfig::default()))
    }

    #[tokio::test]
    async fn test_cache_failure_is_isolated_from_database() {
        let aggregator = HealthAggregator::new(Arc::new(HealthyStore), unready_cache());

        let report = aggregator.probe().await;

        assert!(!report.is_ok());
        assert!(report.components["database"].connected);
        assert!(!report.components["cache"].connected);
    }

    #[tokio::test]
    async fn test_database_failure_degrades() {
        let aggregator = HealthAggregator::new(Arc::new(FailingStore), unready_cache());

        let report = aggregator.probe().await;

        assert!(!report.is_ok());
        assert!(!report.components["database"].connected);
    }

    #[tokio::test]
    async fn test_probe_does_not_mutate_cache_state() {
        let cache = unready_cache();
        let aggregator = HealthAggregator::new(Arc::new(HealthyStore), Arc::clone(&cache));

        aggregator.probe().await;
        aggregator.probe().await;

        assert_eq!(cache.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_report_names_the_service() {
        let aggregator = HealthAggregator::new(Arc::new(HealthyStore), unready_cache());
        let report = aggregator.probe().await;
        assert_eq!(report.service, SERVICE_NAME);
    }
}
