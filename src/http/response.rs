//! Error responses.
//!
//! # Responsibilities
//! - Map gateway errors to HTTP status codes and JSON bodies
//!
//! # Design Decisions
//! - Critical failures become a generic 500; whether a dependency timed out
//!   or failed is never revealed to the caller
//! - Bodies are always `{"error": "..."}`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::downstream::{DownstreamError, UnknownBehavior};
use crate::orchestrator::OrchestratorError;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The orchestrator ran out of degradation paths.
    Critical,
    /// Unknown simulation target or behavior.
    BadRequest(String),
    /// The mock service could not be reached.
    Notify { service: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Critical | ApiError::Notify { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Critical => "Critical System Failure".to_string(),
            ApiError::BadRequest(reason) => reason.clone(),
            ApiError::Notify { service } => format!("Failed to notify {} service", service),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(_: OrchestratorError) -> Self {
        ApiError::Critical
    }
}

impl From<DownstreamError> for ApiError {
    fn from(err: DownstreamError) -> Self {
        match err {
            DownstreamError::UnknownService(service) => {
                ApiError::BadRequest(format!("Unknown service: {}", service))
            }
            DownstreamError::Transport { service, .. } | DownstreamError::Status { service, .. } => {
                ApiError::Notify { service: service.to_string() }
            }
        }
    }
}

impl From<UnknownBehavior> for ApiError {
    fn from(UnknownBehavior(behavior): UnknownBehavior) -> Self {
        ApiError::BadRequest(format!("Unknown behavior: {}", behavior))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
