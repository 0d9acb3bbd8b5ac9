//! Rolling outcome window.
//!
//! # Responsibilities
//! - Record the outcome of every attempted call with its timestamp
//! - Report volume and failure rate over the trailing interval
//! - Evict expired entries lazily from the oldest end
//!
//! # Design Decisions
//! - Timestamps are monotonic (`tokio::time::Instant`), so eviction only ever
//!   touches the front of the queue
//! - Timeouts count as failures when computing the rate
//! - Not thread-safe on its own; always accessed under the breaker's lock

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Result of a single attempted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    Timeout,
}

impl Outcome {
    /// Failures and timeouts both count against the dependency.
    pub fn is_failing(self) -> bool {
        !matches!(self, Outcome::Success)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Timeout => "timeout",
        }
    }
}

/// Aggregates over the live part of the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowSnapshot {
    pub volume: usize,
    pub successes: usize,
    pub failures: usize,
    pub timeouts: usize,
    /// Fraction of failing outcomes in `0.0..=1.0`; `0.0` for an empty window.
    pub failure_rate: f64,
}

/// Time-bounded sequence of call outcomes.
#[derive(Debug)]
pub struct RollingWindow {
    interval: Duration,
    entries: VecDeque<(Instant, Outcome)>,
}

impl RollingWindow {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            entries: VecDeque::new(),
        }
    }

    /// Append an outcome observed at `at`.
    pub fn record(&mut self, outcome: Outcome, at: Instant) {
        self.evict(at);
        self.entries.push_back((at, outcome));
    }

    /// Compute volume and failure rate over entries newer than `now - interval`.
    pub fn snapshot(&mut self, now: Instant) -> WindowSnapshot {
        self.evict(now);

        let mut snapshot = WindowSnapshot::default();
        for (_, outcome) in &self.entries {
            match outcome {
                Outcome::Success => snapshot.successes += 1,
                Outcome::Failure => snapshot.failures += 1,
                Outcome::Timeout => snapshot.timeouts += 1,
            }
        }
        snapshot.volume = self.entries.len();
        if snapshot.volume > 0 {
            snapshot.failure_rate =
                (snapshot.failures + snapshot.timeouts) as f64 / snapshot.volume as f64;
        }
        snapshot
    }

    /// Drop every recorded outcome.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict(&mut self, now: Instant) {
        // Before the process has been alive for a full interval nothing can be stale.
        let Some(cutoff) = now.checked_sub(self.interval) else {
            return;
        };
        while let Some((at, _)) = self.entries.front() {
            if *at > cutoff {
                break;
            }
            self.entries.pop_front();
        }
    }
}
