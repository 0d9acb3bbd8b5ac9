//! Resilient recommendation gateway library.

// Core subsystems
pub mod config;
pub mod downstream;
pub mod http;
pub mod orchestrator;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use orchestrator::RecommendationOrchestrator;
pub use resilience::CircuitBreaker;
