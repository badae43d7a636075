// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fixed-delay retry loop.
//!
//! Every wait in the SDK (token acquisition, task polling, device readiness,
//! service availability) is a blocking sleep-then-retry loop with a constant
//! delay and a hard attempt ceiling. There is no backoff and no jitter.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Result, SdkError};

/// Retry budget: at most `max_attempts` tries, `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Budget for slow waits such as device readiness.
    pub fn long() -> Self {
        Self {
            max_attempts: 120,
            delay: Duration::from_secs(1),
        }
    }

    /// A single attempt.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Drive `op` until it reports [`Step::Done`], fails definitively, or the
    /// budget runs out.
    ///
    /// Retryable errors (see [`SdkError::is_retryable`]) consume an attempt
    /// like [`Step::Pending`] does; any other error is returned immediately.
    pub(crate) fn run<T>(
        &self,
        operation: &str,
        mut op: impl FnMut(u32) -> Result<Step<T>>,
    ) -> Result<Outcome<T>> {
        let attempts = self.attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            match op(attempt) {
                Ok(Step::Done(value)) => return Ok(Outcome::Completed(value)),
                Ok(Step::Pending) => {
                    debug!(operation, attempt, "Not complete yet");
                    last_error = None;
                }
                Err(err) if err.is_retryable() => {
                    warn!(operation, attempt, error = %err, "Attempt failed, will retry");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }

            if attempt < attempts && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }

        Ok(Outcome::Exhausted {
            attempts,
            last_error,
        })
    }

    /// Retry `op` on transient errors.
    ///
    /// When the budget runs out the last transient error is returned.
    pub fn retry<T>(&self, operation: &str, mut op: impl FnMut(u32) -> Result<T>) -> Result<T> {
        match self.run(operation, |attempt| op(attempt).map(Step::Done))? {
            Outcome::Completed(value) => Ok(value),
            Outcome::Exhausted {
                attempts,
                last_error,
            } => Err(last_error.unwrap_or_else(|| SdkError::Timeout {
                operation: operation.to_string(),
                attempts,
            })),
        }
    }
}

/// Result of one attempt.
#[derive(Debug)]
pub(crate) enum Step<T> {
    Done(T),
    Pending,
}

/// Result of a whole retry loop.
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    Completed(T),
    Exhausted {
        attempts: u32,
        /// Error from the final attempt, if it failed rather than pended.
        last_error: Option<SdkError>,
    },
}
