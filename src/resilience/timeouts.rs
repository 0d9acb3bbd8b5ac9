//! Timeout enforcement.
//!
//! # Responsibilities
//! - Give every guarded call its own deadline
//! - Report whether the call completed, panicked or ran out of time
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The guarded future runs as its own task; on deadline the task is detached,
//!   not aborted, so the downstream request is left to finish on its own
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

/// What happened to a call run under a deadline.
#[derive(Debug)]
pub enum Deadline<T> {
    /// The call finished in time with this value.
    Completed(T),
    /// The call's task panicked before finishing.
    Panicked,
    /// The deadline passed first; the call keeps running unobserved.
    Elapsed,
}

/// Run `call` on its own task and wait at most `limit` for it.
pub async fn run_with_deadline<F>(limit: Duration, call: F) -> Deadline<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(call);
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(value)) => Deadline::Completed(value),
        Ok(Err(join_err)) => {
            tracing::error!(error = %join_err, "Guarded call task failed");
            Deadline::Panicked
        }
        // Dropping the JoinHandle detaches the task.
        Err(_) => Deadline::Elapsed,
    }
}
