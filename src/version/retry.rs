//! Retry with exponential backoff and jitter for transient failures
//!
//! Only errors that classify themselves as transient are retried; anything
//! else is returned to the caller on the first failure. When retries run out,
//! the last error is returned as-is so the root cause stays visible.
//!
//! ```ignore
//! let versions = policy
//!     .run("fetch versions", || registry.fetch_once(cluster_type))
//!     .await?;
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::config::RetryConfig;
use crate::version::error::FetchError;

/// Lower and upper bound of the jitter added on top of each backoff delay
const JITTER_RANGE: (f64, f64) = (0.1, 0.3);

/// Classifies errors into retryable and final
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

impl Retryable for FetchError {
    fn is_transient(&self) -> bool {
        FetchError::is_transient(self)
    }
}

/// Backoff schedule applied around a single network call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            backoff_factor: config.backoff_factor,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `retry` (0-indexed), before jitter is applied
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    /// Inflate a delay by a uniformly random 10-30%
    pub fn with_jitter(delay: Duration) -> Duration {
        let jitter = rand::thread_rng().gen_range(JITTER_RANGE.0..=JITTER_RANGE.1);
        delay.mul_f64(1.0 + jitter)
    }

    /// Upper bound on wall-clock time for a fully retried call whose attempts
    /// each time out after `attempt_timeout`
    pub fn max_total_duration(&self, attempt_timeout: Duration) -> Duration {
        let attempts = attempt_timeout * (self.max_retries + 1);
        let backoff: Duration = (0..self.max_retries)
            .map(|n| self.delay_for(n).mul_f64(1.0 + JITTER_RANGE.1))
            .sum();
        attempts + backoff
    }

    /// Run `operation`, retrying transient failures according to this policy
    pub async fn run<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut retry = 0u32;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    if retry >= self.max_retries {
                        error!(
                            operation = %operation_name,
                            attempt = retry + 1,
                            error = %e,
                            "Operation failed after max retries"
                        );
                        return Err(e);
                    }

                    let delay = Self::with_jitter(self.delay_for(retry));
                    warn!(
                        operation = %operation_name,
                        attempt = retry + 1,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Operation failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }

    #[test]
    fn delay_for_doubles_until_capped() {
        let policy = policy(10);

        let delays: Vec<u64> = (0..8).map(|n| policy.delay_for(n).as_secs()).collect();

        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn jittered_delay_stays_within_thirty_percent() {
        let policy = policy(10);

        for n in 0..7 {
            let delay = policy.delay_for(n);
            for _ in 0..50 {
                let realized = RetryPolicy::with_jitter(delay);
                assert!(realized >= delay, "{:?} < {:?}", realized, delay);
                assert!(realized <= delay.mul_f64(1.3), "{:?} > 1.3 * {:?}", realized, delay);
            }
        }
    }

    #[test]
    fn max_total_duration_sums_timeouts_and_worst_case_backoff() {
        let policy = policy(3);

        // 4 attempts * 30s + 1.3 * (1 + 2 + 4)s
        let expected = Duration::from_secs(120) + Duration::from_secs_f64(1.3 * 7.0);
        let bound = policy.max_total_duration(Duration::from_secs(30));

        assert!((bound.as_secs_f64() - expected.as_secs_f64()).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let started = tokio::time::Instant::now();

        let result: Result<i32, TestError> = policy(5)
            .run("op", || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(count.load(Ordering::SeqCst), 3);

        // Two sleeps of 1s and 2s, each inflated by 10-30% (timer rounds up to the ms)
        let elapsed = started.elapsed().as_secs_f64();
        assert!((3.29..=3.95).contains(&elapsed), "elapsed {}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_after_exhausting_retries() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<i32, TestError> = policy(3)
            .run("op", || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Transient)
                }
            })
            .await;

        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let result: Result<i32, TestError> = policy(3)
            .run("op", || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Fatal)
                }
            })
            .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
