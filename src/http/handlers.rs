//! Route handlers.

use std::collections::BTreeMap;
use std::time::Instant;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::downstream::Behavior;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::orchestrator::BreakerMetrics;

/// `GET /recommendations/{user_id}`
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let start = Instant::now();
    let response = match state.orchestrator.get_recommendations(&user_id).await {
        Ok(recommendations) => Json(recommendations).into_response(),
        Err(err) => {
            tracing::error!(user_id = %user_id, error = %err, "Recommendation request failed");
            ApiError::from(err).into_response()
        }
    };
    metrics::record_request("recommendations", response.status().as_u16(), start);
    response
}

/// `GET /metrics/circuit-breakers`
pub async fn get_breaker_metrics(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, BreakerMetrics>> {
    Json(state.orchestrator.metrics())
}

/// `POST /simulate/{service}/{behavior}`
pub async fn simulate(
    State(state): State<AppState>,
    Path((service, behavior)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let parsed: Behavior = behavior.parse()?;
    state.downstream.simulate(&service, parsed).await?;

    Ok(Json(json!({
        "message": format!("Simulation updated: {} is now {}", service, behavior)
    })))
}

/// `GET /health`
pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
