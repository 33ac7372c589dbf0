//! Composite health report types.
//!
//! A report is constructed fresh on every probe and never cached. Each
//! dependency contributes a per-component `connected` flag; the overall
//! status is `ok` only when every component is connected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Overall verdict of a composite health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All probed dependencies answered their liveness round trip.
    Ok,
    /// At least one dependency failed its liveness round trip.
    Degraded,
}

/// Liveness of a single dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub connected: bool,
}

impl ComponentHealth {
    #[must_use]
    pub fn connected() -> Self {
        Self { connected: true }
    }

    #[must_use]
    pub fn disconnected() -> Self {
        Self { connected: false }
    }
}

/// Point-in-time composite health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub service: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl HealthReport {
    /// Builds a report from named component results.
    ///
    /// The overall status is `Ok` only if every component is connected.
    #[must_use]
    pub fn new(
        service: impl Into<String>,
        components: impl IntoIterator<Item = (&'static str, ComponentHealth)>,
    ) -> Self {
        let components: BTreeMap<String, ComponentHealth> = components
            .into_iter()
            .map(|(name, health)| (name.to_string(), health))
            .collect();

        let status = if components.values().all(|c| c.connected) {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            service: service.into(),
            timestamp: OffsetDateTime::now_utc(),
            components,
        }
    }

    /// True when every probed component answered.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}
