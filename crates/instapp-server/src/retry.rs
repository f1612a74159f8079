//! Exponential backoff for calls to remote services.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Why a retried call gave up
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The classifier rejected the error; no retry was attempted.
    #[error("{0}")]
    Permanent(E),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

/// Attempt counter with exponential backoff and optional jitter.
///
/// After failed attempt `n` (1-based) the policy waits `base_delay * 2^n`
/// plus up to `jitter`, so three attempts wait `2 * base` then `4 * base`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            jitter: Duration::ZERO,
        }
    }

    /// Add a random `0..=jitter` to every wait.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after failed attempt `attempt`, jitter excluded
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    fn jitter(&self) -> Duration {
        if self.jitter.is_zero() {
            return Duration::ZERO;
        }
        let millis = self.jitter.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }

    /// Run `f` until it succeeds, `is_transient` rejects its error, or the
    /// attempts run out.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        op: &str,
        is_transient: P,
        mut f: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(op, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !is_transient(&e) => {
                    tracing::debug!(op, attempt, error = %e, "Permanent failure, not retrying");
                    return Err(RetryError::Permanent(e));
                }
                Err(e) if attempt >= self.max_attempts => {
                    tracing::error!(op, attempts = attempt, error = %e, "Retries exhausted");
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    let delay = self.backoff(attempt) + self.jitter();
                    tracing::warn!(
                        op,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum Failure {
        Transient,
        Forbidden,
    }

    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn transient(e: &Failure) -> bool {
        *e == Failure::Transient
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_transient_failures() {
        let base = Duration::from_millis(100);
        let policy = RetryPolicy::new(3, base);
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result = policy
            .run("read", transient, move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Failure::Transient)
                } else {
                    Ok("rows")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "rows");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= base * 2 + base * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result: Result<(), _> = policy
            .run("read", transient, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Failure::Forbidden)
            })
            .await;

        assert!(matches!(result, Err(RetryError::Permanent(Failure::Forbidden))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_carries_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10))
            .with_jitter(Duration::from_millis(1000));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = policy
            .run("write", transient, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Failure::Transient)
            })
            .await;

        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, Failure::Transient);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
