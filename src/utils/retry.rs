//! Caller-side retry with exponential backoff.
//!
//! The pipeline never retries on its own. Callers that want resilience around
//! `query` or `ingest_*` wrap the call with [`with_retry`].

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Backoff policy for [`with_retry`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero means a single attempt.
    pub retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Delay multiplier applied after each failed attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_secs_f64(delay.as_secs_f64() * self.multiplier).min(self.max_delay)
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Success { value: T, attempts: u32 },
    Failed { last_error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryOutcome::Success { value, .. } => Ok(value),
            RetryOutcome::Failed { last_error, .. } => Err(last_error),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Success { attempts, .. } | RetryOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Determines if an error is worth another attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `operation`, retrying transient failures according to `policy`.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> RetryOutcome<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.retries.saturating_add(1);
    let mut attempts = 0;
    let mut delay = policy.initial_delay;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => return RetryOutcome::Success { value, attempts },
            Err(error) => {
                if attempts >= max_attempts || !error.is_retryable() {
                    return RetryOutcome::Failed {
                        last_error: error,
                        attempts,
                    };
                }

                warn!(attempt = attempts, delay_ms = delay.as_millis() as u64, error = %error, "retrying");
                sleep(delay).await;
                delay = policy.next_delay(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct FlakyError(&'static str);

    impl std::fmt::Display for FlakyError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Retryable for FlakyError {
        fn is_retryable(&self) -> bool {
            self.0.contains("transient")
        }
    }

    fn fast(retries: u32) -> RetryPolicy {
        RetryPolicy::new(retries).with_initial_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let counter = AtomicU32::new(0);
        let outcome = with_retry(&fast(0), || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(FlakyError("transient"))
        })
        .await;

        assert_eq!(outcome.attempts(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let outcome = with_retry(&fast(3), || async {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FlakyError("transient"))
            } else {
                Ok("answer")
            }
        })
        .await;

        assert_eq!(outcome.attempts(), 3);
        assert_eq!(outcome.into_result().unwrap(), "answer");
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let counter = AtomicU32::new(0);
        let outcome = with_retry(&fast(5), || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(FlakyError("bad credentials"))
        })
        .await;

        assert_eq!(outcome.attempts(), 1);
        assert!(outcome.into_result().is_err());
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let outcome = with_retry(&fast(2), || async { Err::<(), _>(FlakyError("transient")) }).await;
        assert_eq!(outcome.attempts(), 3);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::new(10).with_max_delay(Duration::from_millis(300));
        let delay = policy.next_delay(Duration::from_millis(250));
        assert_eq!(delay, Duration::from_millis(300));
    }
}
