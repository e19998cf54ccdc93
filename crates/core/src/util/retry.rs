//! Retry utilities with exponential backoff
//!
//! Both helpers take their limits from a [`CallPolicy`]. With the default
//! policy an operation runs exactly once and never times out.

use crate::config::CallPolicy;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Calculate the delay before the retry that follows `attempt`
fn delay_for_attempt(policy: &CallPolicy, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let delay_ms = policy.initial_delay.as_millis() as f64 * policy.backoff_multiplier.powi(exponent);
    let delay = Duration::from_millis(delay_ms.min(u64::MAX as f64) as u64);
    delay.min(policy.max_delay)
}

/// Retry a function with exponential backoff
pub async fn retry_with_backoff<F, T, E, Fut>(
    policy: &CallPolicy,
    mut f: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("Operation succeeded on attempt {}", attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                let delay = delay_for_attempt(policy, attempt);
                warn!(
                    "Operation failed on attempt {}/{}, retrying after {:?}",
                    attempt, max_attempts, delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Bound `fut` by the policy's request timeout, mapping expiry to `on_timeout`.
pub async fn with_timeout<T, E, Fut>(
    policy: &CallPolicy,
    fut: Fut,
    on_timeout: impl FnOnce() -> E,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    match policy.request_timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|_| Err(on_timeout())),
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> CallPolicy {
        CallPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_delay_calculation() {
        let policy = CallPolicy {
            initial_delay: Duration::from_millis(100),
            ..Default::default()
        };

        assert_eq!(delay_for_attempt(&policy, 1), Duration::from_millis(100));
        assert_eq!(delay_for_attempt(&policy, 2), Duration::from_millis(200));
        assert_eq!(delay_for_attempt(&policy, 3), Duration::from_millis(400));
        assert_eq!(delay_for_attempt(&policy, 4), Duration::from_millis(800));
    }

    #[test]
    fn test_max_delay() {
        let policy = CallPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 10.0,
            max_delay: Duration::from_secs(1),
            request_timeout: None,
        };

        assert_eq!(delay_for_attempt(&policy, 5), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn default_policy_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_with_backoff(
            &CallPolicy::default(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("throttled") }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Err("throttled"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry_with_backoff(
            &fast_policy(3),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { if n < 3 { Err("throttled") } else { Ok(n) } }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_with_backoff(
            &fast_policy(5),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("rejected") }
            },
            |e| *e != "rejected",
        )
        .await;
        assert_eq!(result, Err("rejected"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeout_maps_to_error() {
        let policy = CallPolicy {
            request_timeout: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        let result: Result<(), &str> =
            with_timeout(&policy, futures::future::pending(), || "timed out").await;
        assert_eq!(result, Err("timed out"));
    }
}
