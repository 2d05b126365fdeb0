//! Exponential backoff around calls to external stores.
//!
//! The same [`RetryPolicy`] wraps every fetch from the catalog and every call
//! to the search index. Only errors that report themselves as [`Transient`]
//! are retried; anything else is returned on the first failure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use movies_indexer_repository::{SearchIndexError, SourceError};
use tokio_retry::RetryIf;
use tracing::{error, warn};

use crate::errors::EtlError;

/// Errors that may succeed if the failing operation is repeated.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        SourceError::is_transient(self)
    }
}

impl Transient for SearchIndexError {
    fn is_transient(&self) -> bool {
        SearchIndexError::is_transient(self)
    }
}

impl Transient for EtlError {
    fn is_transient(&self) -> bool {
        EtlError::is_transient(self)
    }
}

/// Backoff schedule: attempt `n + 1` waits `min(base_delay * 2^n, max_delay)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Total attempts, including the first one. At least 1.
    pub max_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: usize) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Delay before the retry that follows failed attempt number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// The full schedule: one delay per retry, `max_attempts - 1` in total.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let policy = *self;
        (0..policy.max_attempts.saturating_sub(1)).map(move |n| {
            policy.delay_for(u32::try_from(n).unwrap_or(u32::MAX))
        })
    }

    /// Run `action`, retrying transient errors.
    ///
    /// On exhaustion the last error is returned unchanged.
    pub async fn run<T, E, A, F>(&self, operation: &str, action: A) -> Result<T, E>
    where
        A: FnMut() -> F,
        F: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        self.run_if(operation, action, |err: &E| err.is_transient()).await
    }

    /// Run `action`, retrying the errors `condition` accepts.
    pub async fn run_if<T, E, A, F, C>(
        &self,
        operation: &str,
        action: A,
        mut condition: C,
    ) -> Result<T, E>
    where
        A: FnMut() -> F,
        F: Future<Output = Result<T, E>>,
        C: FnMut(&E) -> bool,
        E: Display,
    {
        let max_attempts = self.max_attempts;
        let mut attempt = 0usize;
        let mut retryable = false;

        let result = RetryIf::spawn(self.delays(), action, |err: &E| {
            attempt += 1;
            retryable = condition(err);
            if retryable && attempt < max_attempts {
                warn!(
                    operation = operation,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %err,
                    "Transient failure, retrying"
                );
            }
            retryable
        })
        .await;

        if let Err(err) = &result {
            if retryable {
                error!(
                    operation = operation,
                    attempts = attempt,
                    error = %err,
                    "Retries exhausted"
                );
            }
        }

        result
    }
}
