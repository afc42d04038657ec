//! Retry with exponential back-off for chat API deliveries.
//!
//! A 429 carries its own `Retry-After`; the wait before the next attempt is
//! the larger of that and the exponential schedule. Non-retriable errors
//! (4xx other than 429, empty alerts) are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::NotifyError;

/// Returns `true` if `err` is transient and worth another attempt.
///
/// Retriable:
/// - [`NotifyError::RateLimited`] — HTTP 429.
/// - [`NotifyError::Http`] — connection reset, timeout, and similar.
/// - [`NotifyError::UnexpectedStatus`] with a 5xx status.
fn is_retriable(err: &NotifyError) -> bool {
    match err {
        NotifyError::RateLimited { .. } | NotifyError::Http(_) => true,
        NotifyError::UnexpectedStatus { status, .. } => *status >= 500,
        NotifyError::EmptyAlert => false,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` times.
///
/// The sleep before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds, raised to the server's `Retry-After` when rate limited.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, NotifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NotifyError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let mut delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        if let NotifyError::RateLimited { retry_after_secs } = &err {
            delay_secs = delay_secs.max(*retry_after_secs);
        }
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "chat delivery failed; retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
