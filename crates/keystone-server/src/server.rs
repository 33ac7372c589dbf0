use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use keystone_cache::CacheFacade;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::shutdown::ShutdownCoordinator;
use crate::{config::AppConfig, handlers, health::HealthAggregator, middleware as app_middleware};

/// State injected into request handlers.
///
/// Holds non-owning references: handlers read through the facade and the
/// aggregator but never manage connection lifecycles.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheFacade,
    pub health: Arc<HealthAggregator>,
}

pub fn build_app(cfg: &AppConfig, state: AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        // Middleware stack (outermost last: request id must be assigned
        // before the trace span reads it)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct KeystoneServer {
    addr: SocketAddr,
    app: Router,
    coordinator: Arc<ShutdownCoordinator>,
}

pub struct ServerBuilder {
    config: AppConfig,
    state: Option<AppState>,
    coordinator: Option<Arc<ShutdownCoordinator>>,
}

impl ServerBuilder {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            coordinator: None,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn with_coordinator(mut self, coordinator: Arc<ShutdownCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    pub fn build(self) -> anyhow::Result<KeystoneServer> {
        let state = self
            .state
            .ok_or_else(|| anyhow::anyhow!("server state is required"))?;
        let coordinator = self
            .coordinator
            .ok_or_else(|| anyhow::anyhow!("shutdown coordinator is required"))?;

        let addr = self.config.addr();
        let app = build_app(&self.config, state);

        Ok(KeystoneServer {
            addr,
            app,
            coordinator,
        })
    }
}

impl KeystoneServer {
    /// Serves until a termination signal, then runs the drain sequence.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(ShutdownCoordinator::wait_for_signal())
            .await?;

        // In-flight requests have drained; release owned resources.
        self.coordinator.shutdown().await;
        Ok(())
    }
}
