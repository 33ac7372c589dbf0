//! Integration tests for the HTTP surface.
//!
//! Starts the real router on an ephemeral port with an in-memory data
//! store double and an unconnected cache, then exercises the info and
//! health endpoints over the wire.

use std::sync::Arc;

use async_trait::async_trait;
use keystone_cache::{CacheConfig, CacheConnection, CacheFacade};
use keystone_core::{DataStore, DataStoreError};
use keystone_server::{AppConfig, AppState, HealthAggregator, build_app};
use serde_json::Value;
use tokio::task::JoinHandle;

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

fn state_with(store: Arc<dyn DataStore>) -> AppState {
    // Never initialized, so the cache component always reports down.
    let cache = Arc::new(CacheConnection::new(CacheConfig::default()));
    AppState {
        cache: CacheFacade::new(Arc::clone(&cache)),
        health: Arc::new(HealthAggregator::new(store, cache)),
    }
}

async fn start_server(
    state: AppState,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let config = AppConfig::default();
    let app = build_app(&config, state);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

#[tokio::test]
async fn test_root_reports_service_info() {
    let (base, stop, handle) = start_server(state_with(Arc::new(HealthyStore))).await;

    let res = reqwest::get(format!("{base}/")).await.expect("request");
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["service"], "keystone-auth");
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());

    let _ = stop.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn test_healthz_is_always_ok() {
    // Liveness must not depend on downstream components.
    let (base, stop, handle) = start_server(state_with(Arc::new(FailingStore))).await;

    let res = reqwest::get(format!("{base}/healthz")).await.expect("request");
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["status"], "ok");

    let _ = stop.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn test_health_degraded_when_cache_down() {
    let (base, stop, handle) = start_server(state_with(Arc::new(HealthyStore))).await;

    let res = reqwest::get(format!("{base}/health")).await.expect("request");
    assert_eq!(res.status(), 503);

    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["service"], "keystone-auth");
    assert_eq!(body["components"]["database"]["connected"], true);
    assert_eq!(body["components"]["cache"]["connected"], false);
    assert!(body["timestamp"].is_string());

    let _ = stop.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn test_health_degraded_when_database_down() {
    let (base, stop, handle) = start_server(state_with(Arc::new(FailingStore))).await;

    let res = reqwest::get(format!("{base}/health")).await.expect("request");
    assert_eq!(res.status(), 503);

    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["components"]["database"]["connected"], false);

    let _ = stop.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (base, stop, handle) = start_server(state_with(Arc::new(HealthyStore))).await;

    let client = reqwest::Client::new();

    // Generated when absent
    let res = client
        .get(format!("{base}/healthz"))
        .send()
        .await
        .expect("request");
    assert!(res.headers().contains_key("x-request-id"));

    // Preserved when supplied
    let res = client
        .get(format!("{base}/healthz"))
        .header("x-request-id", "test-id-42")
        .send()
        .await
        .expect("request");
    assert_eq!(
        res.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("test-id-42")
    );

    let _ = stop.send(());
    let _ = handle.await;
}
