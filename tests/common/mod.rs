//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use recommendation_gateway::downstream::{
    Behavior, ContentSource, DownstreamError, DownstreamResult, Movie, ProfileSource, TrendingSource,
    UserProfile,
};

/// Delay used by the `Slow` behavior; longer than the default breaker deadline.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

pub fn movie(movie_id: u64, title: &str, genre: &str) -> Movie {
    Movie { movie_id, title: title.to_string(), genre: genre.to_string() }
}

pub fn trending_movies() -> Vec<Movie> {
    vec![
        movie(99, "Trending Movie 1", "Popular"),
        movie(98, "Trending Movie 2", "New Release"),
        movie(97, "Trending Movie 3", "Classic"),
    ]
}

/// Switchable behavior plus a call counter, shared between a stub and its test.
#[derive(Clone)]
pub struct Knob {
    behavior: Arc<Mutex<Behavior>>,
    calls: Arc<AtomicUsize>,
}

impl Knob {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn get(&self) -> Behavior {
        *self.behavior.lock().unwrap()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Count the call, then resolve `value` according to the current behavior.
    fn serve<T: Send + 'static>(
        &self,
        service: &'static str,
        value: T,
    ) -> BoxFuture<'static, DownstreamResult<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.get();
        async move {
            match behavior {
                Behavior::Normal => Ok(value),
                Behavior::Slow => {
                    tokio::time::sleep(SLOW_DELAY).await;
                    Ok(value)
                }
                Behavior::Fail => Err(DownstreamError::Status { service, status: 500 }),
            }
        }
        .boxed()
    }
}

/// In-process profile service.
pub struct StubProfiles {
    pub knob: Knob,
    pub preferences: Vec<String>,
}

impl ProfileSource for StubProfiles {
    fn fetch_user_profile(&self, user_id: String) -> BoxFuture<'static, DownstreamResult<UserProfile>> {
        let profile = UserProfile { user_id, preferences: self.preferences.clone(), fallback: false };
        self.knob.serve("user-profile", profile)
    }
}

/// In-process content service that remembers the last preferences it saw.
pub struct StubContent {
    pub knob: Knob,
    pub movies: Vec<Movie>,
    pub last_preferences: Mutex<Option<Vec<String>>>,
}

impl StubContent {
    pub fn new(knob: Knob, movies: Vec<Movie>) -> Self {
        Self { knob, movies, last_preferences: Mutex::new(None) }
    }

    pub fn last_preferences(&self) -> Option<Vec<String>> {
        self.last_preferences.lock().unwrap().clone()
    }
}

impl ContentSource for StubContent {
    fn fetch_content(&self, preferences: Vec<String>) -> BoxFuture<'static, DownstreamResult<Vec<Movie>>> {
        *self.last_preferences.lock().unwrap() = Some(preferences);
        self.knob.serve("content", self.movies.clone())
    }
}

/// In-process trending service.
pub struct StubTrending {
    pub knob: Knob,
}

impl TrendingSource for StubTrending {
    fn fetch_trending(&self) -> BoxFuture<'static, DownstreamResult<Vec<Movie>>> {
        self.knob.serve("trending", trending_movies())
    }
}

/// Bind an ephemeral port and serve `app` on it.
pub async fn start_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// HTTP mock of one downstream service, driven by a [`Knob`].
pub async fn start_mock_downstream(service: &'static str, knob: Knob) -> SocketAddr {
    let app = match service {
        "user-profile" => Router::new().route("/user/{user_id}", get(mock_user)),
        "content" => Router::new().route("/movies", get(mock_movies)),
        _ => Router::new().route("/trending", get(mock_trending)),
    }
    .route("/simulate", post(mock_simulate))
    .with_state(knob);

    start_server(app).await
}

async fn mock_respond(knob: &Knob, body: Value) -> Response {
    knob.calls.fetch_add(1, Ordering::SeqCst);
    match knob.get() {
        Behavior::Fail => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Service Failed" }))).into_response(),
        Behavior::Slow => {
            tokio::time::sleep(SLOW_DELAY).await;
            Json(body).into_response()
        }
        Behavior::Normal => Json(body).into_response(),
    }
}

async fn mock_user(State(knob): State<Knob>, Path(user_id): Path<String>) -> Response {
    mock_respond(&knob, json!({ "userId": user_id, "preferences": ["Action", "Sci-Fi"] })).await
}

async fn mock_movies(State(knob): State<Knob>) -> Response {
    let movies = vec![movie(101, "Inception", "Sci-Fi"), movie(102, "The Dark Knight", "Action")];
    mock_respond(&knob, json!(movies)).await
}

async fn mock_trending(State(knob): State<Knob>) -> Response {
    mock_respond(&knob, json!(trending_movies())).await
}

async fn mock_simulate(State(knob): State<Knob>, Json(body): Json<Value>) -> Response {
    match body["behavior"].as_str().map(str::parse::<Behavior>) {
        Some(Ok(behavior)) => {
            knob.set(behavior);
            Json(json!({ "status": "success", "behavior": behavior })).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "Behavior not provided" }))).into_response(),
    }
}
