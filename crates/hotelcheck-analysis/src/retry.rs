//! Retry with exponential back-off and jitter for embedding lookups.
//!
//! [`retry_with_backoff`] wraps a single embedding computation and retries it
//! on transient failures (timeouts, connection errors, 429, 5xx). Everything
//! else is returned on the first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::{AnalysisError, EmbeddingFailure};

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Timeouts and connection failures.
/// - HTTP 429 and 5xx responses.
///
/// **Not retriable:**
/// - Other HTTP statuses (401, 400, ...): the request itself is wrong.
/// - Malformed payloads, configuration errors, empty input, dimension errors.
pub(crate) fn is_retriable(err: &AnalysisError) -> bool {
    match err {
        AnalysisError::EmbeddingUnavailable(EmbeddingFailure::Http(e)) => {
            e.is_timeout() || e.is_connect()
        }
        AnalysisError::EmbeddingUnavailable(EmbeddingFailure::Status { status, .. }) => {
            *status == 429 || (500..600).contains(status)
        }
        AnalysisError::EmbeddingUnavailable(EmbeddingFailure::Malformed(_))
        | AnalysisError::DimensionMismatch { .. }
        | AnalysisError::DegenerateVector
        | AnalysisError::AnalysisUnavailable { .. }
        | AnalysisError::Configuration(_)
        | AnalysisError::EmptyText => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 500`:
///
/// | Attempt | Sleep before next attempt     |
/// |---------|-------------------------------|
/// | 1       | 500 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 500 ms × 2¹ ± 25 % jitter     |
/// | 3       | 500 ms × 2² ± 25 % jitter     |
///
/// Delay is capped at 30 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient embedding error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
