use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Fixed-delay retry policy applied to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total runs = 1 initial + retries)
    pub retries: u32,
    /// Delay between attempts, never grows
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        RetryPolicy { retries, delay }
    }

    pub fn no_retry() -> Self {
        RetryPolicy {
            retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(3, Duration::from_secs(5 * 60))
    }
}

/// Retries an async operation according to `policy`
///
/// # Parameters
/// - `operation`: Closure receiving the 1-based attempt number and returning a future
/// - `policy`: Attempt budget and fixed delay between attempts
///
/// # Returns
/// The successful value or the last error, together with the number of attempts made
pub async fn with_retry<F, Fut, T, E>(mut operation: F, policy: &RetryPolicy) -> (Result<T, E>, u32)
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(val) => return (Ok(val), attempt),
            Err(err) => {
                if attempt >= max_attempts {
                    return (Err(err), attempt);
                }
                warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    "Attempt failed, retrying in {:?}",
                    policy.delay
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(300));
        let started = tokio::time::Instant::now();

        let (result, attempts) = with_retry(
            |_| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("failure {n}")) } else { Ok(n) }
            },
            &policy,
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(attempts, 3);
        // Two fixed delays, no growth
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(600) && elapsed < Duration::from_secs(601));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let (result, attempts) = with_retry(
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err::<(), _>(format!("attempt {attempt}")) }
            },
            &policy,
        )
        .await;

        assert_eq!(result, Err("attempt 4".to_string()));
        assert_eq!(attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_no_retry_policy() {
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
        assert_eq!(RetryPolicy::default().max_attempts(), 4);
    }
}
