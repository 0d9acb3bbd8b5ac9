//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through under a deadline
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: a single trial call tests whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: volume >= minimum_volume && failure rate >= threshold
//! Open → Half-Open: first call after reset_timeout (that call is the trial)
//! Half-Open → Closed: trial succeeds (window starts fresh)
//! Half-Open → Open: trial fails or times out
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, shared by all requests through `Arc`
//! - State lives behind a mutex held only for admission and outcome recording,
//!   never across the guarded call
//! - Single trial in Half-Open; concurrent callers are rejected, not queued
//! - Every transition bumps an epoch so late results from an earlier state
//!   cannot flip the current one
//! - Deadline and outcome recording run on a task of their own; a caller
//!   that stops waiting does not erase the outcome
//! - Fallbacks replace the caller's result but never the recorded outcome

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::resilience::stats::{Outcome, RollingWindow};
use crate::resilience::timeouts::{run_with_deadline, Deadline};

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakerState::Closed => "CLOSED",
            BreakerState::Open => "OPEN",
            BreakerState::HalfOpen => "HALF_OPEN",
        }
    }
}

/// Errors returned by [`CircuitBreaker::fire`] when no fallback is registered.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Short-circuited; the operation was not invoked.
    #[error("circuit breaker '{breaker}' is open")]
    Open { breaker: String },

    /// The operation missed its deadline.
    #[error("call through '{breaker}' timed out after {timeout:?}")]
    Timeout { breaker: String, timeout: Duration },

    /// The operation itself failed.
    #[error("call through '{breaker}' failed")]
    Dependency {
        breaker: String,
        #[source]
        source: E,
    },

    /// The operation's task panicked.
    #[error("call through '{breaker}' aborted")]
    Aborted { breaker: String },
}

/// Lifetime counters plus the current window aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BreakerStats {
    pub successes: u64,
    pub failures: u64,
    pub timeouts: u64,
    /// Calls short-circuited without reaching the dependency.
    pub rejections: u64,
    /// Calls answered by the fallback.
    pub fallbacks: u64,
    pub window_volume: usize,
    pub window_failure_rate: f64,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { opened_at: Instant },
    HalfOpen,
}

impl Phase {
    fn state(self) -> BreakerState {
        match self {
            Phase::Closed => BreakerState::Closed,
            Phase::Open { .. } => BreakerState::Open,
            Phase::HalfOpen => BreakerState::HalfOpen,
        }
    }
}

#[derive(Debug)]
struct Core {
    phase: Phase,
    epoch: u64,
    window: RollingWindow,
    stats: BreakerStats,
}

enum Admission {
    Call { epoch: u64 },
    Reject,
}

/// Non-generic half of the breaker: identity, thresholds and guarded state.
#[derive(Debug)]
struct Shared {
    name: String,
    config: BreakerConfig,
    core: Mutex<Core>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self) -> Admission {
        let now = Instant::now();
        let mut core = self.lock();
        let phase = core.phase;
        match phase {
            Phase::Closed => Admission::Call { epoch: core.epoch },
            Phase::Open { opened_at } if now.duration_since(opened_at) >= self.config.reset_timeout() => {
                self.transition(&mut core, Phase::HalfOpen);
                Admission::Call { epoch: core.epoch }
            }
            Phase::Open { .. } | Phase::HalfOpen => {
                core.stats.rejections += 1;
                metrics::record_breaker_rejection(&self.name);
                tracing::debug!(breaker = %self.name, state = phase.state().as_str(), "Call short-circuited");
                Admission::Reject
            }
        }
    }

    fn complete(&self, epoch: u64, outcome: Outcome) {
        let now = Instant::now();
        let mut core = self.lock();

        match outcome {
            Outcome::Success => core.stats.successes += 1,
            Outcome::Failure => core.stats.failures += 1,
            Outcome::Timeout => core.stats.timeouts += 1,
        }
        metrics::record_breaker_outcome(&self.name, outcome);

        if core.epoch != epoch {
            tracing::debug!(breaker = %self.name, outcome = outcome.as_str(), "Ignoring outcome admitted under an earlier state");
            return;
        }

        let phase = core.phase;
        match phase {
            Phase::HalfOpen if outcome.is_failing() => {
                self.transition(&mut core, Phase::Open { opened_at: now });
            }
            Phase::HalfOpen => {
                core.window.clear();
                self.transition(&mut core, Phase::Closed);
            }
            Phase::Closed => {
                core.window.record(outcome, now);
                let snapshot = core.window.snapshot(now);
                let failing = snapshot.failures + snapshot.timeouts;
                // Integer form of `failure_rate * 100 >= threshold`.
                let breached = failing * 100 >= self.config.error_threshold_percent as usize * snapshot.volume;
                if snapshot.volume >= self.config.minimum_volume && breached {
                    tracing::warn!(
                        breaker = %self.name,
                        volume = snapshot.volume,
                        failure_rate = snapshot.failure_rate,
                        "Failure threshold breached"
                    );
                    self.transition(&mut core, Phase::Open { opened_at: now });
                }
            }
            // A matching epoch is never handed out while open.
            Phase::Open { .. } => {}
        }
    }

    fn transition(&self, core: &mut Core, next: Phase) {
        let from = core.phase.state();
        core.phase = next;
        core.epoch += 1;

        let to = next.state();
        metrics::record_breaker_state(&self.name, to);
        match to {
            BreakerState::Open => tracing::warn!(breaker = %self.name, from = from.as_str(), "Circuit opened"),
            BreakerState::HalfOpen => tracing::info!(breaker = %self.name, "Circuit half-open, sending trial call"),
            BreakerState::Closed => tracing::info!(breaker = %self.name, from = from.as_str(), "Circuit closed"),
        }
    }

    fn state(&self) -> BreakerState {
        self.lock().phase.state()
    }

    fn stats(&self) -> BreakerStats {
        let now = Instant::now();
        let mut core = self.lock();
        let snapshot = core.window.snapshot(now);
        BreakerStats {
            window_volume: snapshot.volume,
            window_failure_rate: snapshot.failure_rate,
            ..core.stats
        }
    }
}

type Operation<I, O, E> = Box<dyn Fn(I) -> BoxFuture<'static, Result<O, E>> + Send + Sync>;
type Fallback<O> = Box<dyn Fn() -> BoxFuture<'static, O> + Send + Sync>;

/// Guards one asynchronous operation `I -> Result<O, E>`.
pub struct CircuitBreaker<I, O, E> {
    shared: Arc<Shared>,
    operation: Operation<I, O, E>,
    fallback: Option<Fallback<O>>,
}

impl<I, O, E> CircuitBreaker<I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
{
    /// Create a closed breaker around `operation`.
    pub fn new<F, Fut>(name: impl Into<String>, config: BreakerConfig, operation: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
    {
        let window = RollingWindow::new(config.stats_interval());
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                config,
                core: Mutex::new(Core {
                    phase: Phase::Closed,
                    epoch: 0,
                    window,
                    stats: BreakerStats::default(),
                }),
            }),
            operation: Box::new(move |input| operation(input).boxed()),
            fallback: None,
        }
    }

    /// Register a synchronous substitute used whenever the call is skipped or fails.
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn() -> O + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(move || {
            let value = fallback();
            async move { value }.boxed()
        }));
        self
    }

    /// Register an asynchronous substitute.
    pub fn fallback_async<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        self.fallback = Some(Box::new(move || fallback().boxed()));
        self
    }

    /// Run the guarded operation, substituting the fallback on any failure.
    pub async fn fire(&self, input: I) -> Result<O, BreakerError<E>> {
        let err = match self.call(input).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Some(fallback) = &self.fallback else {
            return Err(err);
        };
        self.shared.lock().stats.fallbacks += 1;
        tracing::debug!(breaker = %self.shared.name, reason = %err, "Serving fallback");
        Ok(fallback().await)
    }

    async fn call(&self, input: I) -> Result<O, BreakerError<E>> {
        let epoch = match self.shared.admit() {
            Admission::Call { epoch } => epoch,
            Admission::Reject => return Err(BreakerError::Open { breaker: self.shared.name.clone() }),
        };

        let shared = self.shared.clone();
        let pending = (self.operation)(input);
        // Dropping the handle detaches the recorder; the outcome is still recorded.
        let recorder = tokio::spawn(async move {
            let breaker = shared.name.clone();
            let timeout = shared.config.timeout();
            let (outcome, result) = match run_with_deadline(timeout, pending).await {
                Deadline::Completed(Ok(value)) => (Outcome::Success, Ok(value)),
                Deadline::Completed(Err(source)) => {
                    (Outcome::Failure, Err(BreakerError::Dependency { breaker, source }))
                }
                Deadline::Panicked => (Outcome::Failure, Err(BreakerError::Aborted { breaker })),
                Deadline::Elapsed => (Outcome::Timeout, Err(BreakerError::Timeout { breaker, timeout })),
            };
            shared.complete(epoch, outcome);
            result
        });

        match recorder.await {
            Ok(result) => result,
            Err(join_err) => {
                tracing::error!(breaker = %self.shared.name, error = %join_err, "Outcome recorder task failed");
                Err(BreakerError::Aborted { breaker: self.shared.name.clone() })
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> BreakerState {
        self.shared.state()
    }

    pub fn stats(&self) -> BreakerStats {
        self.shared.stats()
    }
}

/// Type-erased read-only view of a breaker, used by the registry.
pub trait BreakerHandle: Send + Sync {
    fn name(&self) -> &str;
    fn state(&self) -> BreakerState;
    fn stats(&self) -> BreakerStats;
}

impl<I, O, E> BreakerHandle for CircuitBreaker<I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
{
    fn name(&self) -> &str {
        CircuitBreaker::name(self)
    }

    fn state(&self) -> BreakerState {
        CircuitBreaker::state(self)
    }

    fn stats(&self) -> BreakerStats {
        CircuitBreaker::stats(self)
    }
}
