//! Downstream capabilities.
//!
//! # Data Flow
//! ```text
//! orchestrator
//!     → ProfileSource::fetch_user_profile   (guarded by "user-profile" breaker)
//!     → ContentSource::fetch_content        (guarded by "content" breaker)
//!     → TrendingSource::fetch_trending      (unguarded, last resort)
//! ```
//!
//! # Design Decisions
//! - Capabilities are traits so the orchestrator never depends on HTTP
//! - Futures are `'static` because guarded calls run on their own task
//! - `client.rs` is the only implementation that talks to the network

pub mod client;
pub mod types;

use futures_util::future::BoxFuture;

pub use client::DownstreamClient;
pub use types::{Behavior, DownstreamError, DownstreamResult, Movie, UnknownBehavior, UserProfile};

/// Fetch a user profile by id.
pub trait ProfileSource: Send + Sync + 'static {
    fn fetch_user_profile(&self, user_id: String) -> BoxFuture<'static, DownstreamResult<UserProfile>>;
}

/// Fetch movies matching a preference list.
pub trait ContentSource: Send + Sync + 'static {
    fn fetch_content(&self, preferences: Vec<String>) -> BoxFuture<'static, DownstreamResult<Vec<Movie>>>;
}

/// Fetch the always-available trending list.
pub trait TrendingSource: Send + Sync + 'static {
    fn fetch_trending(&self) -> BoxFuture<'static, DownstreamResult<Vec<Movie>>>;
}
