//! Response shapes produced by the orchestrator.

use serde::Serialize;

use crate::downstream::{Movie, UserProfile};
use crate::resilience::{BreakerHandle, BreakerState};

/// Message shown when only trending movies could be served.
pub const DEGRADED_MESSAGE: &str =
    "Our recommendation service is temporarily degraded. Here are some trending movies.";

/// The three valid recommendation payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecommendationResponse {
    /// Real profile, whatever content could be fetched.
    Personalized { user: UserProfile, movies: Vec<Movie> },

    /// Default profile, but real content for its preferences.
    PartialFallback {
        user: UserProfile,
        movies: Vec<Movie>,
        fallback_triggered_for: String,
    },

    /// Both profile and content degraded; trending list instead.
    Trending {
        message: String,
        trending: Vec<Movie>,
        fallback_triggered_for: String,
    },
}

impl RecommendationResponse {
    /// Which degradation steps were taken, if any.
    pub fn fallback_triggered_for(&self) -> Option<&str> {
        match self {
            RecommendationResponse::Personalized { .. } => None,
            RecommendationResponse::PartialFallback { fallback_triggered_for, .. }
            | RecommendationResponse::Trending { fallback_triggered_for, .. } => {
                Some(fallback_triggered_for)
            }
        }
    }
}

/// Per-breaker entry of the metrics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerMetrics {
    pub state: BreakerState,
    pub success_count: u64,
    /// Failures and timeouts together.
    pub failure_count: u64,
}

impl BreakerMetrics {
    pub fn from_handle(breaker: &dyn BreakerHandle) -> Self {
        let stats = breaker.stats();
        Self {
            state: breaker.state(),
            success_count: stats.successes,
            failure_count: stats.failures + stats.timeouts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shapes_serialize_flat() {
        let movie = Movie { movie_id: 1, title: "A".into(), genre: "Action".into() };
        let user = UserProfile { user_id: "7".into(), preferences: vec!["Action".into()], fallback: false };

        let personalized = RecommendationResponse::Personalized { user: user.clone(), movies: vec![movie.clone()] };
        assert_eq!(
            serde_json::to_value(&personalized).unwrap(),
            json!({
                "user": {"userId": "7", "preferences": ["Action"]},
                "movies": [{"movieId": 1, "title": "A", "genre": "Action"}]
            })
        );
        assert_eq!(personalized.fallback_triggered_for(), None);

        let trending = RecommendationResponse::Trending {
            message: DEGRADED_MESSAGE.into(),
            trending: vec![movie],
            fallback_triggered_for: "user-profile, content".into(),
        };
        let value = serde_json::to_value(&trending).unwrap();
        assert_eq!(value["fallback_triggered_for"], "user-profile, content");
        assert!(value.get("user").is_none());
        assert_eq!(trending.fallback_triggered_for(), Some("user-profile, content"));
    }

    #[test]
    fn test_breaker_metrics_wire_format() {
        let metrics = BreakerMetrics { state: BreakerState::HalfOpen, success_count: 3, failure_count: 2 };
        assert_eq!(
            serde_json::to_value(metrics).unwrap(),
            json!({"state": "HALF_OPEN", "successCount": 3, "failureCount": 2})
        );
    }
}
