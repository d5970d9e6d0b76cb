//! Retry with exponential backoff for store requests.
//!
//! Rate limits, 5xx answers and connection failures are retried; anything
//! else is returned at once.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any delay.
    pub max_delay: Duration,
    /// Delay growth factor per attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay before `attempt` (0 is the initial attempt).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let base = self.initial_delay.as_secs_f64()
            * self
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }
}

/// True if a store error is worth another attempt.
#[must_use]
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::RateLimit(_) | Error::Io(_) => true,
        Error::Http(e) => e.is_timeout() || e.is_connect(),
        Error::Store(msg) => {
            let msg = msg.to_lowercase();
            ["500", "502", "503", "504", "timeout", "connection reset"]
                .iter()
                .any(|p| msg.contains(p))
        }
        _ => false,
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = config.delay_for_attempt(attempt);
            debug!(
                "{}: retry {}/{} after {:?}",
                operation_name, attempt, config.max_retries, delay
            );
            sleep(delay).await;
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < config.max_retries && is_retryable_error(&e) => {
                warn!("{}: retryable error: {}", operation_name, e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_delay_for_attempt_exponential() {
        let config = RetryConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(100),
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig {
            initial_delay: Duration::from_secs(10),
            backoff_multiplier: 10.0,
            max_delay: Duration::from_secs(30),
            ..Default::default()
        };
        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(30));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(is_retryable_error(&Error::RateLimit(60)));
        assert!(is_retryable_error(&Error::Store(
            "Data API error 503: unavailable".to_string()
        )));
        assert!(!is_retryable_error(&Error::Store(
            "Data API error 400: bad request".to_string()
        )));
        assert!(!is_retryable_error(&Error::Authentication("401".to_string())));
        assert!(!is_retryable_error(&Error::Config("bad".to_string())));
    }

    #[tokio::test]
    async fn test_with_retry_recovers() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&fast(3), "insert", || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Store("Data API error 502: bad gateway".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = with_retry(&fast(2), "insert", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::RateLimit(1))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_non_retryable() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = with_retry(&fast(5), "clear", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::Authentication("HTTP 401".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
