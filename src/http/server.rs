//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Build the downstream client and the orchestrator
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;
use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::downstream::{DownstreamClient, DownstreamError};
use crate::http::handlers;
use crate::http::request::{MakeRequestUuidV4, RequestIdExt};
use crate::orchestrator::{OrchestratorError, RecommendationOrchestrator};

/// Error type for server construction and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build downstream client: {0}")]
    Downstream(#[from] DownstreamError),

    #[error("failed to assemble orchestrator: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RecommendationOrchestrator>,
    pub downstream: DownstreamClient,
}

/// HTTP server for the recommendation gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    orchestrator: Arc<RecommendationOrchestrator>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let downstream = DownstreamClient::new(config.downstream.clone())?;
        let source = Arc::new(downstream.clone());
        let orchestrator = Arc::new(RecommendationOrchestrator::new(
            &config.breaker,
            source.clone(),
            source.clone(),
            source,
        )?);

        let state = AppState {
            orchestrator: orchestrator.clone(),
            downstream,
        };
        let router = Self::build_router(&config, state);

        Ok(Self {
            router,
            config,
            orchestrator,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/recommendations/{user_id}", get(handlers::get_recommendations))
            .route("/metrics/circuit-breakers", get(handlers::get_breaker_metrics))
            .route("/simulate/{service}/{behavior}", post(handlers::simulate))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request.request_id(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            timeout_ms = self.config.breaker.timeout_ms,
            error_threshold_percent = self.config.breaker.error_threshold_percent,
            reset_timeout_ms = self.config.breaker.reset_timeout_ms,
            "Gateway running"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<RecommendationOrchestrator> {
        &self.orchestrator
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
