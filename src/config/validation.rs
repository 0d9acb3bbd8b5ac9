//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, threshold within 1..=100)
//! - Check that addresses and downstream URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("breaker.error_threshold_percent must be within 1..=100, got {0}")]
    ThresholdOutOfRange(u32),

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} is not a valid http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let breaker = &config.breaker;
    for (field, value) in [
        ("breaker.timeout_ms", breaker.timeout_ms),
        ("breaker.reset_timeout_ms", breaker.reset_timeout_ms),
        ("breaker.stats_interval_ms", breaker.stats_interval_ms),
        ("listener.request_timeout_secs", config.listener.request_timeout_secs),
        ("downstream.request_timeout_secs", config.downstream.request_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    // A zero volume would let the very first failure open the circuit.
    if breaker.minimum_volume == 0 {
        errors.push(ValidationError::Zero { field: "breaker.minimum_volume" });
    }
    if !(1..=100).contains(&breaker.error_threshold_percent) {
        errors.push(ValidationError::ThresholdOutOfRange(breaker.error_threshold_percent));
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    let downstream = &config.downstream;
    check_url(&mut errors, "downstream.user_profile_url", &downstream.user_profile_url);
    check_url(&mut errors, "downstream.content_url", &downstream.content_url);
    check_url(&mut errors, "downstream.trending_url", &downstream.trending_url);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress { field, value: value.to_string() });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl { field, value: value.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.breaker.minimum_volume = 0;
        config.breaker.error_threshold_percent = 150;
        config.breaker.timeout_ms = 0;
        config.downstream.content_url = "ftp://content".to_string();
        config.listener.bind_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::Zero { field: "breaker.minimum_volume" }));
        assert!(errors.contains(&ValidationError::ThresholdOutOfRange(150)));
        assert!(errors.contains(&ValidationError::Zero { field: "breaker.timeout_ms" }));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nope".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
