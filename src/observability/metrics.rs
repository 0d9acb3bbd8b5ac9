//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_breaker_calls_total` (counter): guarded call outcomes by breaker
//! - `gateway_breaker_rejections_total` (counter): short-circuited calls by breaker
//! - `gateway_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `gateway_fallbacks_total` (counter): degradation steps taken, by stage
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition runs on its own listener

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::circuit_breaker::BreakerState;
use crate::resilience::stats::Outcome;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a served request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("gateway_requests_total", "route" => route, "status" => status).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_breaker_outcome(breaker: &str, outcome: Outcome) {
    metrics::counter!(
        "gateway_breaker_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_breaker_rejection(breaker: &str) {
    metrics::counter!("gateway_breaker_rejections_total", "breaker" => breaker.to_string()).increment(1);
}

pub fn record_breaker_state(breaker: &str, state: BreakerState) {
    let value = match state {
        BreakerState::Closed => 0.0,
        BreakerState::Open => 1.0,
        BreakerState::HalfOpen => 2.0,
    };
    metrics::gauge!("gateway_breaker_state", "breaker" => breaker.to_string()).set(value);
}

/// Record a degradation step (`user-profile`, `content`, `trending`).
pub fn record_fallback(stage: &'static str) {
    metrics::counter!("gateway_fallbacks_total", "stage" => stage).increment(1);
}
