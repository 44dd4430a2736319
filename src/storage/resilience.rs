//! Connection retry with capped exponential backoff.
//!
//! The durable backend is connected once at startup. Attempts are bounded both
//! by count and by total elapsed time so a missing Redis delays boot by at most
//! a few seconds before the service falls back to memory.
//!
//! # Usage
//!
//! ```rust,ignore
//! use todolist::storage::{RetryPolicy, retry_connection};
//!
//! let conn = retry_connection(&RetryPolicy::default(), "redis", || open())?;
//! ```

use crate::Result;
use std::time::{Duration, Instant};

/// Retry policy for establishing a backend connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Sleep before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for a single sleep.
    pub max_backoff: Duration,
    /// Upper bound for the whole retry loop.
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(500),
            max_elapsed: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            max_elapsed: Duration::ZERO,
        }
    }

    /// Sets the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial backoff.
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Sets the per-sleep backoff cap.
    #[must_use]
    pub const fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Sets the total elapsed-time cap.
    #[must_use]
    pub const fn with_max_elapsed(mut self, elapsed: Duration) -> Self {
        self.max_elapsed = elapsed;
        self
    }

    /// Returns the sleep before attempt `attempt + 1`, where `attempt` starts at 1.
    ///
    /// Doubles from `initial_backoff` and saturates at `max_backoff`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1_u32 << exponent)
            .min(self.max_backoff)
    }
}

/// Runs `connect` until it succeeds or the policy is exhausted.
///
/// Returns the last error once `max_attempts` is reached or the next sleep
/// would cross `max_elapsed`.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub fn retry_connection<T, F>(policy: &RetryPolicy, backend: &'static str, mut connect: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match connect() {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(backend, attempt, "Connected after retry");
                }
                return Ok(value);
            },
            Err(e) => {
                let backoff = policy.backoff_for(attempt);
                let exhausted = attempt >= max_attempts
                    || started.elapsed().saturating_add(backoff) > policy.max_elapsed;

                if exhausted {
                    tracing::warn!(
                        backend,
                        attempts = attempt,
                        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Giving up on backend connection"
                    );
                    return Err(e);
                }

                tracing::debug!(
                    backend,
                    attempt,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Connection attempt failed, retrying"
                );
                std::thread::sleep(backoff);
                attempt += 1;
            },
        }
    }
}
