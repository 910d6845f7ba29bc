//! Common helpers shared across clients

use crate::config::RetryConfig;
use crate::error::{MirrorError, Result};

/// Run `op` up to `retry.max_attempts` times with a fixed delay between
/// attempts.
///
/// The delay is deliberately fixed rather than exponential: the dominant
/// failure mode targeted is transient network blips, not sustained outages.
/// Errors whose [`MirrorError::is_retryable`] is false short-circuit the
/// loop immediately.
pub async fn with_retry<T, F, Fut>(retry: &RetryConfig, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_err = MirrorError::Network(format!("{}: no attempts made", what));

    for attempt in 1..=retry.max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() {
                    return Err(err);
                }
                last_err = err;
                if attempt < retry.max_attempts {
                    tokio::time::sleep(retry.delay()).await;
                }
            }
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry(attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts: attempts,
            delay_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result = with_retry(&fast_retry(3), "op", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, MirrorError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result = with_retry(&fast_retry(3), "op", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(MirrorError::Network("blip".into()))
                } else {
                    Ok(1)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result: Result<()> = with_retry(&fast_retry(3), "op", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(MirrorError::Network("down".into()))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let result: Result<()> = with_retry(&fast_retry(5), "op", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(MirrorError::Parse("bad json".into()))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
