//! Stand-in for the profile, content and trending services.
//!
//! Behavior (`normal`, `slow`, `fail`) is switched at runtime through
//! `POST /simulate`, which is what the gateway's simulate endpoint calls.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use serde_json::json;

use recommendation_gateway::downstream::{Behavior, Movie, UserProfile};

const SLOW_DELAY: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, ValueEnum)]
enum Service {
    UserProfile,
    Content,
    Trending,
}

impl Service {
    fn default_port(self) -> u16 {
        match self {
            Service::UserProfile => 8081,
            Service::Content => 8082,
            Service::Trending => 8083,
        }
    }
}

#[derive(Parser)]
#[command(name = "mock-downstream")]
#[command(about = "Mock downstream service for exercising the gateway", long_about = None)]
struct Args {
    #[arg(short, long, value_enum)]
    service: Service,

    /// Defaults to 8081, 8082 or 8083 depending on the service
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Clone)]
struct MockState {
    behavior: Arc<RwLock<Behavior>>,
}

impl MockState {
    fn current(&self) -> Behavior {
        *self.behavior.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, behavior: Behavior) {
        *self.behavior.write().unwrap_or_else(|e| e.into_inner()) = behavior;
        tracing::info!(?behavior, "Behavior updated");
    }
}

#[derive(Deserialize)]
struct SimulateBody {
    behavior: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let state = MockState { behavior: Arc::new(RwLock::new(Behavior::Normal)) };

    let app = match args.service {
        Service::UserProfile => Router::new().route("/user/{user_id}", get(user_profile)),
        Service::Content => Router::new().route("/movies", get(movies)),
        Service::Trending => Router::new().route("/trending", get(trending)),
    }
    .route("/simulate", post(simulate))
    .route("/set-behavior/{behavior}", post(set_behavior))
    .route("/health", get(|| async { StatusCode::OK }))
    .with_state(state);

    let port = args.port.unwrap_or_else(|| args.service.default_port());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Mock downstream listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Apply the current behavior before producing `body`.
async fn respond<T: serde::Serialize + Send>(state: &MockState, body: T) -> Response {
    match state.current() {
        Behavior::Fail => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Service Failed" }))).into_response()
        }
        Behavior::Slow => {
            tokio::time::sleep(SLOW_DELAY).await;
            Json(body).into_response()
        }
        Behavior::Normal => Json(body).into_response(),
    }
}

async fn user_profile(State(state): State<MockState>, Path(user_id): Path<String>) -> Response {
    let profile = UserProfile {
        user_id,
        preferences: vec!["Action".to_string(), "Sci-Fi".to_string()],
        fallback: false,
    };
    respond(&state, profile).await
}

async fn movies(State(state): State<MockState>) -> Response {
    respond(
        &state,
        vec![movie(101, "Inception", "Sci-Fi"), movie(102, "The Dark Knight", "Action")],
    )
    .await
}

async fn trending(State(state): State<MockState>) -> Response {
    respond(
        &state,
        vec![
            movie(99, "Trending Movie 1", "Popular"),
            movie(98, "Trending Movie 2", "New Release"),
            movie(97, "Trending Movie 3", "Classic"),
        ],
    )
    .await
}

async fn simulate(State(state): State<MockState>, Json(body): Json<SimulateBody>) -> Response {
    let Some(requested) = body.behavior else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Behavior not provided" }))).into_response();
    };
    apply(&state, &requested)
}

async fn set_behavior(State(state): State<MockState>, Path(requested): Path<String>) -> Response {
    apply(&state, &requested)
}

fn apply(state: &MockState, requested: &str) -> Response {
    match requested.parse::<Behavior>() {
        Ok(behavior) => {
            state.set(behavior);
            Json(json!({ "status": "success", "behavior": behavior })).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

fn movie(movie_id: u64, title: &str, genre: &str) -> Movie {
    Movie { movie_id, title: title.to_string(), genre: genre.to_string() }
}
