//! Exponential-backoff retry for the read-path calls (Plex connect and the
//! Radarr catalog fetch). Write calls are never wrapped.

use crate::error::{ErrorCategory, SourceError};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub multiplier: f64,
    /// Floor of the delay, in units
    pub min: f64,
    /// Ceiling of the delay, in units
    pub max: f64,
    pub unit: Duration,
    pub retry_on: HashSet<ErrorCategory>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            multiplier: 1.0,
            min: 4.0,
            max: 60.0,
            unit: Duration::from_secs(1),
            retry_on: [
                ErrorCategory::ConnectTimeout,
                ErrorCategory::Connection,
                ErrorCategory::PlexApi,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl RetryPolicy {
    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Wait after the `attempt`-th failure (1-based):
    /// `multiplier * 2^(attempt-1)` held between `min` and `max` units.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let units = (self.multiplier * 2f64.powi(exponent))
            .max(self.min)
            .min(self.max);
        self.unit.mul_f64(units)
    }

    pub fn should_retry(&self, err: &SourceError) -> bool {
        self.retry_on.contains(&err.category())
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !self.should_retry(&e) => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    warn!(
                        operation,
                        attempts = attempt,
                        error = %e,
                        "Operation failed after max retries"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn connection_error() -> SourceError {
        SourceError::Connection {
            service: "radarr",
            message: "refused".to_string(),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default().with_unit(Duration::from_millis(1))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert!(policy.retry_on.contains(&ErrorCategory::PlexApi));
        assert!(!policy.retry_on.contains(&ErrorCategory::Status));
    }

    #[test]
    fn test_delay_curve() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=9).map(|n| policy.delay_for_attempt(n).as_secs()).collect();
        assert_eq!(delays, vec![4, 4, 4, 8, 16, 32, 60, 60, 60]);
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("fetch", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(connection_error())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .with_max_attempts(4)
            .run("connect", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SourceError::PlexApi("unavailable".into())) }
            })
            .await;

        assert!(matches!(result, Err(SourceError::PlexApi(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .run("fetch", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(SourceError::Status {
                        service: "radarr",
                        method: "GET",
                        endpoint: "movie".to_string(),
                        status: 401,
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(SourceError::Status { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
