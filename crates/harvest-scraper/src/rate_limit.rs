//! Retry utilities for page fetches.
//!
//! Provides exponential backoff retry logic for transient HTTP errors such as
//! 429 Rate Limited responses. Non-retriable errors (404s, other statuses,
//! renderer failures) are propagated immediately without retrying.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`]: HTTP 429, the server asked us to back off.
/// - [`ScraperError::Http`]: network-level failure (connection reset, timeout, etc.).
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps for `backoff_base_secs * 2^attempt`
/// seconds and tries again, up to `max_retries` additional attempts after the
/// first try. With `max_retries = 0` the operation runs exactly once.
///
/// | Attempt | Sleep before next attempt |
/// |---------|--------------------------|
/// | 0 (initial) | none |
/// | 1 (first retry) | base × 2^0 |
/// | 2 (second retry) | base × 2^1 |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %last_err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> ScraperError {
        ScraperError::RateLimited {
            domain: "www.caris.com.tr".to_owned(),
            retry_after_secs: 0,
        }
    }

    #[tokio::test]
    async fn zero_retries_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(0, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(rate_limited())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, ScraperError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::UnexpectedStatus {
                    status: 503,
                    url: "https://www.caris.com.tr/".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::NotFound {
                    url: "https://www.caris.com.tr/missing".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::NotFound { .. })));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&ScraperError::UnexpectedStatus {
            status: 403,
            url: "https://x".to_owned(),
        }));
        assert!(!is_retriable(&ScraperError::NoPageLoaded));
    }
}
