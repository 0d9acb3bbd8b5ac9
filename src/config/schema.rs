//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the recommendation gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Downstream service locations.
    pub downstream: DownstreamConfig,

    /// Thresholds shared by every circuit breaker.
    pub breaker: BreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound on the total time spent serving one request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Downstream service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Base URL of the user-profile service.
    pub user_profile_url: String,

    /// Base URL of the content service.
    pub content_url: String,

    /// Base URL of the trending service.
    pub trending_url: String,

    /// Transport-level timeout for every downstream HTTP request, in seconds.
    /// The breaker timeout is normally much shorter.
    pub request_timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            user_profile_url: "http://localhost:8081".to_string(),
            content_url: "http://localhost:8082".to_string(),
            trending_url: "http://localhost:8083".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Per-call deadline in milliseconds.
    pub timeout_ms: u64,

    /// Failure rate (percent) at or above which the circuit opens.
    pub error_threshold_percent: u32,

    /// How long the circuit stays open before allowing a trial call, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Calls required in the window before the failure rate is evaluated.
    pub minimum_volume: usize,

    /// Length of the rolling outcome window in milliseconds.
    pub stats_interval_ms: u64,
}

impl BreakerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            error_threshold_percent: 50,
            reset_timeout_ms: 30_000,
            minimum_volume: 5,
            stats_interval_ms: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
