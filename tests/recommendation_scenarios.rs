//! Degradation scenarios driven through the orchestrator with in-process stubs.
//!
//! Time is paused, so breaker deadlines and reset timeouts elapse instantly.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{movie, Knob, StubContent, StubProfiles, StubTrending};
use recommendation_gateway::config::BreakerConfig;
use recommendation_gateway::downstream::{Behavior, Movie, UserProfile};
use recommendation_gateway::orchestrator::{
    OrchestratorError, RecommendationResponse, CONTENT, DEGRADED_MESSAGE, USER_PROFILE,
};
use recommendation_gateway::resilience::BreakerState;
use recommendation_gateway::RecommendationOrchestrator;

struct Harness {
    orchestrator: RecommendationOrchestrator,
    profile: Knob,
    content: Knob,
    trending: Knob,
    catalog: Arc<StubContent>,
}

fn harness(profile: Behavior, content: Behavior, movies: Vec<Movie>) -> Harness {
    let profile = Knob::new(profile);
    let content = Knob::new(content);
    let trending = Knob::new(Behavior::Normal);
    let catalog = Arc::new(StubContent::new(content.clone(), movies));

    let orchestrator = RecommendationOrchestrator::new(
        &BreakerConfig::default(),
        Arc::new(StubProfiles { knob: profile.clone(), preferences: vec!["Action".to_string()] }),
        catalog.clone(),
        Arc::new(StubTrending { knob: trending.clone() }),
    )
    .unwrap();

    Harness { orchestrator, profile, content, trending, catalog }
}

fn state_of(harness: &Harness, name: &str) -> BreakerState {
    harness.orchestrator.registry().get(name).unwrap().state()
}

#[tokio::test(start_paused = true)]
async fn test_healthy_dependencies_give_personalized_response() {
    let h = harness(
        Behavior::Normal,
        Behavior::Normal,
        vec![movie(101, "Inception", "Sci-Fi"), movie(102, "The Dark Knight", "Action")],
    );

    let response = h.orchestrator.get_recommendations("7").await.unwrap();
    assert_eq!(response.fallback_triggered_for(), None);
    match response {
        RecommendationResponse::Personalized { user, movies } => {
            assert_eq!(user.user_id, "7");
            assert!(!user.fallback);
            assert_eq!(movies.len(), 2);
        }
        other => panic!("unexpected response {:?}", other),
    }
    assert_eq!(h.catalog.last_preferences(), Some(vec!["Action".to_string()]));
    assert_eq!(h.trending.calls(), 0);

    let json = serde_json::to_value(
        h.orchestrator.get_recommendations("7").await.unwrap(),
    )
    .unwrap();
    assert!(json.get("fallback_triggered_for").is_none());
    assert_eq!(json["user"]["userId"], "7");
}

#[tokio::test(start_paused = true)]
async fn test_open_profile_breaker_serves_default_profile() {
    let h = harness(Behavior::Fail, Behavior::Normal, vec![movie(201, "Paddington", "Family")]);

    // Five failures reach the minimum volume at a 100% failure rate.
    for _ in 0..5 {
        h.orchestrator.get_recommendations("7").await.unwrap();
    }
    assert_eq!(state_of(&h, USER_PROFILE), BreakerState::Open);
    assert_eq!(h.profile.calls(), 5);

    let response = h.orchestrator.get_recommendations("7").await.unwrap();
    assert_eq!(h.profile.calls(), 5, "open breaker must not reach the profile service");
    assert_eq!(response.fallback_triggered_for(), Some(USER_PROFILE));
    match response {
        RecommendationResponse::PartialFallback { user, movies, .. } => {
            assert_eq!(user, UserProfile::default_fallback());
            assert_eq!(movies.len(), 1);
        }
        other => panic!("unexpected response {:?}", other),
    }
    assert_eq!(
        h.catalog.last_preferences(),
        Some(vec!["Comedy".to_string(), "Family".to_string()])
    );
    assert_eq!(h.trending.calls(), 0);

    let metrics = h.orchestrator.metrics();
    assert_eq!(metrics[USER_PROFILE].state, BreakerState::Open);
    assert_eq!(metrics[USER_PROFILE].failure_count, 5);
    assert_eq!(metrics[CONTENT].success_count, 6);
}

#[tokio::test(start_paused = true)]
async fn test_compound_failure_serves_trending() {
    let h = harness(Behavior::Fail, Behavior::Fail, Vec::new());

    for _ in 0..6 {
        let response = h.orchestrator.get_recommendations("7").await.unwrap();
        assert_eq!(response.fallback_triggered_for(), Some("user-profile, content"));
        match response {
            RecommendationResponse::Trending { message, trending, .. } => {
                assert_eq!(message, DEGRADED_MESSAGE);
                assert_eq!(trending.len(), 3);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    assert_eq!(state_of(&h, USER_PROFILE), BreakerState::Open);
    assert_eq!(state_of(&h, CONTENT), BreakerState::Open);
    assert_eq!(h.profile.calls(), 5);
    assert_eq!(h.content.calls(), 5);
    assert_eq!(h.trending.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_empty_content_with_default_profile_serves_trending() {
    let h = harness(Behavior::Fail, Behavior::Normal, Vec::new());

    let response = h.orchestrator.get_recommendations("7").await.unwrap();
    assert!(matches!(response, RecommendationResponse::Trending { .. }));
    assert_eq!(state_of(&h, CONTENT), BreakerState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_trending_failure_is_critical() {
    let h = harness(Behavior::Fail, Behavior::Fail, Vec::new());
    h.trending.set(Behavior::Fail);

    let err = h.orchestrator.get_recommendations("7").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::CriticalFailure { stage: "trending", .. }));
}

#[tokio::test(start_paused = true)]
async fn test_slow_calls_count_as_failures() {
    let h = harness(Behavior::Slow, Behavior::Normal, vec![movie(201, "Paddington", "Family")]);

    for _ in 0..5 {
        let response = h.orchestrator.get_recommendations("7").await.unwrap();
        assert_eq!(response.fallback_triggered_for(), Some(USER_PROFILE));
    }

    let stats = h.orchestrator.registry().get(USER_PROFILE).unwrap().stats();
    assert_eq!(stats.timeouts, 5);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.fallbacks, 5);
    assert_eq!(state_of(&h, USER_PROFILE), BreakerState::Open);
    assert_eq!(h.orchestrator.metrics()[USER_PROFILE].failure_count, 5);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_timeouts_and_failures_share_the_failure_rate() {
    let h = harness(Behavior::Slow, Behavior::Normal, vec![movie(201, "Paddington", "Family")]);

    for i in 0..5 {
        h.profile.set(if i % 2 == 0 { Behavior::Slow } else { Behavior::Fail });
        h.orchestrator.get_recommendations("7").await.unwrap();
    }

    let stats = h.orchestrator.registry().get(USER_PROFILE).unwrap().stats();
    assert_eq!(stats.timeouts, 3);
    assert_eq!(stats.failures, 2);
    assert_eq!(state_of(&h, USER_PROFILE), BreakerState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_profile_recovers_after_reset_timeout() {
    let h = harness(Behavior::Fail, Behavior::Normal, vec![movie(201, "Paddington", "Family")]);
    for _ in 0..5 {
        h.orchestrator.get_recommendations("7").await.unwrap();
    }
    assert_eq!(state_of(&h, USER_PROFILE), BreakerState::Open);

    h.profile.set(Behavior::Normal);
    tokio::time::advance(Duration::from_millis(BreakerConfig::default().reset_timeout_ms)).await;

    let response = h.orchestrator.get_recommendations("7").await.unwrap();
    assert!(matches!(response, RecommendationResponse::Personalized { .. }));
    assert_eq!(state_of(&h, USER_PROFILE), BreakerState::Closed);
    assert_eq!(h.profile.calls(), 6);
}
