use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::LlmError;

/// Bounded exponential backoff for retryable model failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): base, 2·base, 4·base, … capped at max.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the attempt
/// budget is spent. Exhausting the budget on quota errors yields `RateLimited`;
/// exhausting it on other transient errors yields the last error.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "Model call attempt {}/{} failed ({}), retrying after {}ms...",
                    attempt,
                    max_attempts,
                    err,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(LlmError::QuotaExceeded(_)) => {
                return Err(LlmError::RateLimited { retries: attempt })
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let p = policy(5);
        assert_eq!(p.delay_for(1), Duration::from_secs(5));
        assert_eq!(p.delay_for(2), Duration::from_secs(10));
        assert_eq!(p.delay_for(3), Duration::from_secs(20));
        assert_eq!(p.delay_for(4), Duration::from_secs(30));
        assert_eq!(p.delay_for(40), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_quota_then_succeeds() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_backoff(&policy(3), move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(LlmError::QuotaExceeded("busy".into()))
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_exhaustion_is_rate_limited() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_backoff(&policy(3), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::QuotaExceeded("busy".into()))
        })
        .await;
        assert!(matches!(result, Err(LlmError::RateLimited { retries: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_surfaces_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_backoff(&policy(3), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Api {
                status: 401,
                message: "bad key".into(),
            })
        })
        .await;
        assert!(matches!(result, Err(LlmError::Api { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_exhaustion_returns_last_error() {
        let result: Result<(), _> = with_backoff(&policy(2), || async {
            Err(LlmError::Api {
                status: 529,
                message: "overloaded".into(),
            })
        })
        .await;
        assert!(matches!(result, Err(LlmError::Api { status: 529, .. })));
    }
}
