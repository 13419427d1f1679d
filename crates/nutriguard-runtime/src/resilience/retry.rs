//! Bounded retry with linear backoff.
//!
//! Each invocation walks a small state machine:
//!
//! ```text
//! Attempting(n) --ok--------------------------------> Ok(value)
//!               --non-retryable error---------------> Err(NotRetryable)
//!               --error, n == max-------------------> Err(Exhausted)
//!               --error, n <  max--> Backoff(n) --elapsed--> Attempting(n + 1)
//!                                              --cancelled--> Err(Cancelled)
//! ```
//!
//! The backoff after attempt `n` is `base_delay * n`. Cancellation is
//! cooperative: it is checked before every attempt and raced against every
//! backoff, but an in-flight operation is never interrupted.

use std::future::Future;
use std::time::Duration;

use nutriguard_core::{ErrorClassifier, ErrorRecord, Failure, IntoErrorRecord, TransportFailure};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::AttemptRegistry;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,

    /// Delay unit; the wait after attempt `n` is `base_delay * n`
    #[serde(with = "crate::config::duration_str")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    fn attempts_allowed(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Terminal failure of a retried operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetryError {
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        operation: String,
        attempts: u32,
        /// Error from the final attempt
        last: ErrorRecord,
    },

    #[error("{operation} failed on attempt {attempt}: {record}")]
    NotRetryable {
        operation: String,
        attempt: u32,
        record: ErrorRecord,
    },

    #[error("{operation} was cancelled after {attempts} attempts")]
    Cancelled { operation: String, attempts: u32 },
}

impl RetryError {
    /// The classified error behind this failure, if there was one.
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::NotRetryable { record, .. } => Some(record),
            RetryError::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    /// Collapse into the single record shown to the user.
    pub fn into_record(self, classifier: &ErrorClassifier) -> ErrorRecord {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::NotRetryable { record, .. } => record,
            RetryError::Cancelled { operation, .. } => {
                classifier.classify(&Failure::Transport(TransportFailure::Cancelled), &operation)
            }
        }
    }
}

/// Non-terminal phases of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPhase {
    Attempting { attempt: u32 },
    Backoff { attempt: u32, delay: Duration },
}

/// Runs async operations under a [`RetryPolicy`].
///
/// Owns the attempt counts for every operation key it has seen; the counts
/// live as long as the executor. Share one executor (behind an `Arc`) across
/// tasks so that invocations with the same key see the same counter.
#[derive(Debug, Default)]
pub struct RetryExecutor {
    attempts: AttemptRegistry,
    classifier: ErrorClassifier,
}

impl RetryExecutor {
    pub fn new(classifier: ErrorClassifier) -> Self {
        Self {
            attempts: AttemptRegistry::new(),
            classifier,
        }
    }

    /// Classifier used for errors that are not already records.
    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Failed attempts recorded for `key` since its last success or reset.
    pub fn attempts(&self, key: &str) -> u32 {
        self.attempts.attempts(key)
    }

    /// Explicitly reset the counter for `key`.
    pub fn reset(&self, key: &str) {
        self.attempts.reset(key);
    }

    pub fn registry(&self) -> &AttemptRegistry {
        &self.attempts
    }

    /// Run `operation` until it succeeds, fails non-retryably, or the policy
    /// is exhausted.
    pub async fn run_with_retry<T, E, F, Fut>(
        &self,
        key: &str,
        policy: &RetryPolicy,
        operation: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: IntoErrorRecord,
    {
        let never = CancellationToken::new();
        self.run_with_retry_cancellable(key, policy, &never, operation)
            .await
    }

    /// Like [`run_with_retry`](Self::run_with_retry), stopping early once
    /// `cancel` fires.
    pub async fn run_with_retry_cancellable<T, E, F, Fut>(
        &self,
        key: &str,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: IntoErrorRecord,
    {
        let max_attempts = policy.attempts_allowed();
        let mut phase = RetryPhase::Attempting { attempt: 1 };

        loop {
            phase = match phase {
                RetryPhase::Attempting { attempt } => {
                    if cancel.is_cancelled() {
                        return Err(self.cancelled(key, attempt - 1));
                    }

                    tracing::debug!(operation = key, attempt, max_attempts, "Attempting operation");

                    let error = match operation().await {
                        Ok(value) => {
                            self.attempts.reset(key);
                            if attempt > 1 {
                                tracing::info!(operation = key, attempt, "Operation succeeded after retry");
                            }
                            return Ok(value);
                        }
                        Err(error) => error,
                    };

                    let record = error.into_error_record(&self.classifier, key);
                    let failures = self.attempts.record_failure(key);

                    if !record.is_retryable() {
                        tracing::warn!(
                            operation = key,
                            attempt,
                            kind = ?record.kind(),
                            "Operation failed with non-retryable error"
                        );
                        return Err(RetryError::NotRetryable {
                            operation: key.to_string(),
                            attempt,
                            record,
                        });
                    }

                    if attempt >= max_attempts {
                        tracing::warn!(
                            operation = key,
                            attempts = attempt,
                            kind = ?record.kind(),
                            "Retries exhausted"
                        );
                        return Err(RetryError::Exhausted {
                            operation: key.to_string(),
                            attempts: attempt,
                            last: record,
                        });
                    }

                    let delay = policy.delay_after(attempt);
                    tracing::warn!(
                        operation = key,
                        attempt,
                        failures,
                        delay = ?delay,
                        kind = ?record.kind(),
                        "Attempt failed, backing off"
                    );
                    RetryPhase::Backoff { attempt, delay }
                }
                RetryPhase::Backoff { attempt, delay } => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(self.cancelled(key, attempt));
                        }
                        _ = tokio::time::sleep(delay) => RetryPhase::Attempting { attempt: attempt + 1 },
                    }
                }
            };
        }
    }

    fn cancelled(&self, key: &str, attempts: u32) -> RetryError {
        tracing::info!(operation = key, attempts, "Operation cancelled");
        RetryError::Cancelled {
            operation: key.to_string(),
            attempts,
        }
    }
}
