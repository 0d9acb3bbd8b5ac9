//! Recommendation gateway.
//!
//! Serves personalized movie recommendations while the downstream
//! services it depends on slow down or fail.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /recommendations/{user_id}
//!        │
//!        ▼
//!   ┌──────────┐     ┌──────────────┐
//!   │   http   │────▶│ orchestrator │
//!   │  server  │     └──────┬───────┘
//!   └──────────┘            │
//!          ┌────────────────┼────────────────┐
//!          ▼                ▼                ▼
//!   ┌─────────────┐  ┌─────────────┐  ┌────────────┐
//!   │   breaker   │  │   breaker   │  │  trending  │
//!   │ user-profile│  │   content   │  │ (unguarded)│
//!   └──────┬──────┘  └──────┬──────┘  └─────┬──────┘
//!          └───────── downstream client ────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use recommendation_gateway::config::load_config;
use recommendation_gateway::lifecycle::startup;
use recommendation_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "recommendation-gateway")]
#[command(about = "Recommendation gateway with per-dependency circuit breakers", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    init_logging(&config.observability);
    tracing::info!("recommendation-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        user_profile_url = %config.downstream.user_profile_url,
        content_url = %config.downstream.content_url,
        trending_url = %config.downstream.trending_url,
        breaker_timeout_ms = config.breaker.timeout_ms,
        error_threshold_percent = config.breaker.error_threshold_percent,
        reset_timeout_ms = config.breaker.reset_timeout_ms,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
