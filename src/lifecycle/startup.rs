//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the metrics exporter
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: configuration and bind errors are fatal
//! - A metrics exporter failure is logged, not fatal
//! - Listener starts last (traffic only when ready)

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::observability::metrics;

/// Start every subsystem and serve until a termination signal.
pub async fn run(config: GatewayConfig) -> Result<(), ServerError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.run(listener, server_shutdown).await
}
