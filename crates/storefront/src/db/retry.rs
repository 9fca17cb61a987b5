//! Bounded timeouts and retries around storage calls.
//!
//! Every ledger operation goes through [`StoragePolicy::run`]. Each attempt is
//! bounded by a timeout; failures are retried with jittered exponential backoff
//! according to the operation's [`Replay`] class. When the budget is spent the
//! caller gets [`RepositoryError::Unavailable`].

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use super::RepositoryError;

/// Longest single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Whether an operation may be repeated after an ambiguous failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Repeating the call has the same effect as making it once
    /// (reads, absolute updates, deletes).
    Idempotent,
    /// Repeating a call that may have committed would apply it twice
    /// (quantity increments, like counters, appends, toggles). Only failures
    /// known to have rolled back are retried. Timeouts and other transient
    /// failures that may have committed are not retried and surface as
    /// [`RepositoryError::Unavailable`].
    AtMostOnce,
}

/// Timeout and retry settings shared by all storage calls.
#[derive(Debug, Clone, Copy)]
pub struct StoragePolicy {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before the first retry; doubled on each further retry.
    pub base_backoff: Duration,
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            max_retries: 2,
            base_backoff: Duration::from_millis(50),
        }
    }
}

impl StoragePolicy {
    /// Run a storage call under this policy.
    ///
    /// `call` is invoked once per attempt and must build a fresh future each
    /// time.
    ///
    /// # Errors
    ///
    /// Returns the call's own error when it is not retryable, or
    /// [`RepositoryError::Unavailable`] when the retry budget is exhausted.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        replay: Replay,
        mut call: F,
    ) -> Result<T, RepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let retryable = match tokio::time::timeout(self.timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => {
                    let retryable = match replay {
                        Replay::Idempotent => err.is_transient(),
                        Replay::AtMostOnce => err.is_safe_to_replay(),
                    };
                    if !retryable {
                        // Transient but possibly committed: same outcome as a timeout
                        if replay == Replay::AtMostOnce && err.is_transient() {
                            tracing::error!(operation, attempts = attempt, error = %err, "Storage unavailable");
                            return Err(RepositoryError::Unavailable {
                                operation,
                                attempts: attempt,
                            });
                        }
                        return Err(err);
                    }
                    tracing::warn!(operation, attempt, error = %err, "Storage call failed");
                    true
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        timeout_ms = self.timeout.as_millis(),
                        "Storage call timed out"
                    );
                    replay == Replay::Idempotent
                }
            };

            if !retryable || attempt > self.max_retries {
                tracing::error!(operation, attempts = attempt, "Storage unavailable");
                return Err(RepositoryError::Unavailable {
                    operation,
                    attempts: attempt,
                });
            }

            tokio::time::sleep(self.backoff(attempt)).await;
        }
    }

    /// Sleep before retry number `attempt` (1-based), with up to 50% jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(MAX_BACKOFF);
        let jitter_ms = u64::try_from(exp.as_millis() / 2).unwrap_or(0);
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_ms)
        };
        exp + Duration::from_millis(jitter)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy() -> StoragePolicy {
        StoragePolicy {
            timeout: Duration::from_millis(50),
            max_retries: 2,
            base_backoff: Duration::from_millis(1),
        }
    }

    fn counting() -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (Arc::clone(&calls), calls)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let (calls, counter) = counting();
        let result = fast_policy()
            .run("read", Replay::Idempotent, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, RepositoryError>(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_idempotent_retries_transient_then_succeeds() {
        let (calls, counter) = counting();
        let result = fast_policy()
            .run("read", Replay::Idempotent, || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
                    } else {
                        Ok(1)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_returned_immediately() {
        let (calls, counter) = counting();
        let result: Result<(), _> = fast_policy()
            .run("read", Replay::Idempotent, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RepositoryError::NotFound)
                }
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_unavailable() {
        let (calls, counter) = counting();
        let result: Result<(), _> = fast_policy()
            .run("read", Replay::Idempotent, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
                }
            })
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::Unavailable {
                operation: "read",
                attempts: 3
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_idempotent_timeout_is_retried() {
        let (calls, counter) = counting();
        let result = fast_policy()
            .run("read", Replay::Idempotent, || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                    Ok::<_, RepositoryError>("done")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_at_most_once_timeout_is_not_retried() {
        let (calls, counter) = counting();
        let result: Result<(), _> = fast_policy()
            .run("cart.add_line", Replay::AtMostOnce, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(())
                }
            })
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::Unavailable { attempts: 1, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_at_most_once_does_not_retry_ambiguous_io_error() {
        let (calls, counter) = counting();
        let result: Result<(), _> = fast_policy()
            .run("cart.add_line", Replay::AtMostOnce, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
                    Err(RepositoryError::Database(sqlx::Error::Io(io)))
                }
            })
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::Unavailable {
                operation: "cart.add_line",
                attempts: 1
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_at_most_once_non_transient_error_passes_through() {
        let (calls, counter) = counting();
        let result: Result<(), _> = fast_policy()
            .run("comments.append", Replay::AtMostOnce, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RepositoryError::NotFound)
                }
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_at_most_once_retries_pool_timeout() {
        let (calls, counter) = counting();
        let result = fast_policy()
            .run("cart.add_line", Replay::AtMostOnce, || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let policy = StoragePolicy {
            timeout: Duration::from_secs(1),
            max_retries: 10,
            base_backoff: Duration::from_millis(100),
        };
        let first = policy.backoff(1);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
        let third = policy.backoff(3);
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(600));
        assert!(policy.backoff(20) <= MAX_BACKOFF + MAX_BACKOFF / 2);
    }
}
