//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a downstream dependency:
//!     → circuit_breaker.rs (admit, or short-circuit while open)
//!     → timeouts.rs (enforce the per-call deadline)
//!     → stats.rs (record outcome, evaluate failure rate)
//!     → On failure or short-circuit: registered fallback
//!
//! Metrics:
//!     registry.rs (name → breaker) → /metrics/circuit-breakers
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every guarded call has a deadline
//! - No automatic retries; a failed call is recorded once
//! - Circuit breaker prevents cascading failures
//! - Breaker state is per process, never persisted

pub mod circuit_breaker;
pub mod registry;
pub mod stats;
pub mod timeouts;

pub use circuit_breaker::{BreakerError, BreakerHandle, BreakerState, BreakerStats, CircuitBreaker};
pub use registry::{BreakerRegistry, RegistryError};
pub use stats::Outcome;
