//! Recommendation orchestration.
//!
//! # Degradation Policy
//! ```text
//! profile breaker ──ok──────────────┐
//!        └─fail/open→ default profile│
//!                                    ▼
//! content breaker(preferences) ──ok──→ movies
//!        └─fail/open→ []
//!
//! default profile && movies == []  → trending (unguarded) → Trending shape
//! default profile                  → PartialFallback shape
//! otherwise                        → Personalized shape
//! ```
//!
//! # Design Decisions
//! - Profile fallback alone is tolerated; real content is still served
//! - Only the compound failure escalates to trending
//! - Trending is the source of last resort; its failure is critical

pub mod response;

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::BreakerConfig;
use crate::downstream::{ContentSource, DownstreamError, Movie, ProfileSource, TrendingSource, UserProfile};
use crate::observability::metrics;
use crate::resilience::{BreakerRegistry, CircuitBreaker, RegistryError};

pub use response::{BreakerMetrics, RecommendationResponse, DEGRADED_MESSAGE};

/// Registry name of the profile breaker.
pub const USER_PROFILE: &str = "user-profile";
/// Registry name of the content breaker.
pub const CONTENT: &str = "content";

pub type ProfileBreaker = CircuitBreaker<String, UserProfile, DownstreamError>;
pub type ContentBreaker = CircuitBreaker<Vec<String>, Vec<Movie>, DownstreamError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No degradation path was left for this request.
    #[error("critical failure in {stage}")]
    CriticalFailure {
        stage: &'static str,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Composes the guarded profile and content calls with the trending fallback.
pub struct RecommendationOrchestrator {
    profile: Arc<ProfileBreaker>,
    content: Arc<ContentBreaker>,
    trending: Arc<dyn TrendingSource>,
    registry: BreakerRegistry,
}

impl RecommendationOrchestrator {
    /// Build both breakers from `config` around the given capabilities.
    ///
    /// The profile breaker falls back to [`UserProfile::default_fallback`];
    /// the content breaker has no fallback.
    pub fn new(
        config: &BreakerConfig,
        profiles: Arc<dyn ProfileSource>,
        catalog: Arc<dyn ContentSource>,
        trending: Arc<dyn TrendingSource>,
    ) -> Result<Self, OrchestratorError> {
        let profile = CircuitBreaker::new(USER_PROFILE, config.clone(), move |user_id: String| {
            profiles.fetch_user_profile(user_id)
        })
        .fallback(UserProfile::default_fallback);

        let content = CircuitBreaker::new(CONTENT, config.clone(), move |preferences: Vec<String>| {
            catalog.fetch_content(preferences)
        });

        Self::with_breakers(Arc::new(profile), Arc::new(content), trending)
    }

    /// Assemble from prebuilt breakers and register them for metrics.
    pub fn with_breakers(
        profile: Arc<ProfileBreaker>,
        content: Arc<ContentBreaker>,
        trending: Arc<dyn TrendingSource>,
    ) -> Result<Self, OrchestratorError> {
        let mut registry = BreakerRegistry::new();
        registry.register(profile.name(), profile.clone())?;
        registry.register(content.name(), content.clone())?;

        Ok(Self {
            profile,
            content,
            trending,
            registry,
        })
    }

    /// Resolve recommendations for `user_id`, degrading step by step.
    pub async fn get_recommendations(&self, user_id: &str) -> Result<RecommendationResponse, OrchestratorError> {
        let user = self.profile.fire(user_id.to_string()).await.map_err(|err| {
            tracing::error!(user_id, error = %err, "Profile unavailable and no fallback registered");
            OrchestratorError::CriticalFailure { stage: USER_PROFILE, source: Box::new(err) }
        })?;
        if user.fallback {
            metrics::record_fallback(USER_PROFILE);
            tracing::info!(user_id, "Serving default profile");
        }

        let movies = match self.content.fire(user.preferences.clone()).await {
            Ok(movies) => movies,
            Err(err) => {
                metrics::record_fallback(CONTENT);
                tracing::warn!(user_id, error = %err, "Content unavailable, continuing without recommendations");
                Vec::new()
            }
        };

        if !user.fallback {
            return Ok(RecommendationResponse::Personalized { user, movies });
        }
        if !movies.is_empty() {
            return Ok(RecommendationResponse::PartialFallback {
                user,
                movies,
                fallback_triggered_for: USER_PROFILE.to_string(),
            });
        }

        tracing::warn!(user_id, "Profile and content both degraded, serving trending");
        let trending = self.trending.fetch_trending().await.map_err(|err| {
            tracing::error!(user_id, error = %err, "Trending unavailable");
            OrchestratorError::CriticalFailure { stage: "trending", source: Box::new(err) }
        })?;
        metrics::record_fallback("trending");

        Ok(RecommendationResponse::Trending {
            message: DEGRADED_MESSAGE.to_string(),
            trending,
            fallback_triggered_for: format!("{}, {}", USER_PROFILE, CONTENT),
        })
    }

    /// State and call counts of every registered breaker.
    pub fn metrics(&self) -> BTreeMap<String, BreakerMetrics> {
        self.registry
            .all()
            .map(|(name, breaker)| (name.to_string(), BreakerMetrics::from_handle(breaker.as_ref())))
            .collect()
    }

    pub fn registry(&self) -> &BreakerRegistry {
        &self.registry
    }
}
