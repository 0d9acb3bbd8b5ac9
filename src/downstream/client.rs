//! HTTP client for the downstream services.
//!
//! # Responsibilities
//! - Implement the three capabilities over HTTP/JSON
//! - Forward behavior-simulation requests to the mock services
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` shared by all calls
//! - A generous transport timeout backs up the much shorter breaker deadline
//! - Non-2xx responses are failures, whatever their body

use std::sync::Arc;
use std::time::Duration;
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::DownstreamConfig;
use crate::downstream::types::{Behavior, DownstreamError, DownstreamResult, Movie, UserProfile};
use crate::downstream::{ContentSource, ProfileSource, TrendingSource};

const USER_PROFILE: &str = "user-profile";
const CONTENT: &str = "content";
const TRENDING: &str = "trending";

/// Cheaply cloneable client for all downstream services.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    config: DownstreamConfig,
}

impl DownstreamClient {
    pub fn new(config: DownstreamConfig) -> Result<Self, DownstreamError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|source| DownstreamError::Transport { service: "client", source })?;
        Ok(Self {
            inner: Arc::new(Inner { http, config }),
        })
    }

    /// `GET {user_profile_url}/user/{id}`
    pub async fn user_profile(&self, user_id: &str) -> DownstreamResult<UserProfile> {
        let url = format!("{}/user/{}", base(&self.inner.config.user_profile_url), user_id);
        self.get_json(USER_PROFILE, self.inner.http.get(url)).await
    }

    /// `GET {content_url}/movies?genres=a,b`
    pub async fn content(&self, preferences: &[String]) -> DownstreamResult<Vec<Movie>> {
        let url = format!("{}/movies", base(&self.inner.config.content_url));
        let request = self.inner.http.get(url).query(&[("genres", preferences.join(","))]);
        self.get_json(CONTENT, request).await
    }

    /// `GET {trending_url}/trending`
    pub async fn trending(&self) -> DownstreamResult<Vec<Movie>> {
        let url = format!("{}/trending", base(&self.inner.config.trending_url));
        self.get_json(TRENDING, self.inner.http.get(url)).await
    }

    /// Ask a mock service to switch behavior: `POST {url}/simulate {"behavior": ...}`.
    pub async fn simulate(&self, service: &str, behavior: Behavior) -> DownstreamResult<()> {
        let (service, target) = match service {
            USER_PROFILE => (USER_PROFILE, &self.inner.config.user_profile_url),
            CONTENT => (CONTENT, &self.inner.config.content_url),
            other => return Err(DownstreamError::UnknownService(other.to_string())),
        };

        let response = self
            .inner
            .http
            .post(format!("{}/simulate", base(target)))
            .json(&serde_json::json!({ "behavior": behavior }))
            .send()
            .await
            .map_err(|source| DownstreamError::Transport { service, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownstreamError::Status { service, status: status.as_u16() });
        }
        tracing::info!(service, behavior = ?behavior, "Downstream behavior updated");
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        request: reqwest::RequestBuilder,
    ) -> DownstreamResult<T> {
        let response = request
            .send()
            .await
            .map_err(|source| DownstreamError::Transport { service, source })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(service, status = %status, "Downstream returned error status");
            return Err(DownstreamError::Status { service, status: status.as_u16() });
        }

        response
            .json()
            .await
            .map_err(|source| DownstreamError::Transport { service, source })
    }
}

fn base(url: &str) -> &str {
    url.trim_end_matches('/')
}

impl ProfileSource for DownstreamClient {
    fn fetch_user_profile(&self, user_id: String) -> BoxFuture<'static, DownstreamResult<UserProfile>> {
        let client = self.clone();
        async move { client.user_profile(&user_id).await }.boxed()
    }
}

impl ContentSource for DownstreamClient {
    fn fetch_content(&self, preferences: Vec<String>) -> BoxFuture<'static, DownstreamResult<Vec<Movie>>> {
        let client = self.clone();
        async move { client.content(&preferences).await }.boxed()
    }
}

impl TrendingSource for DownstreamClient {
    fn fetch_trending(&self) -> BoxFuture<'static, DownstreamResult<Vec<Movie>>> {
        let client = self.clone();
        async move { client.trending().await }.boxed()
    }
}
