//! Retry utilities: backoff builders and retryable error classification.
//!
//! Uses `backon` for exponential backoff with jitter.

use backon::ExponentialBuilder;

use crate::behaviors::resilience::CircuitOpenError;
use crate::behaviors::validation::ValidationError;
use crate::behaviors::ResilienceConfig;
use crate::error::{BoxError, Canceled};

/// Backoff for pipeline retries, from resilience settings.
///
/// - Min delay: `retry_base_delay_ms`, doubling per retry
/// - Max delay: `retry_max_delay_ms`
/// - Max attempts: `retry_count` retries after the first call
/// - Jitter enabled
pub fn backoff(config: &ResilienceConfig) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(config.retry_base_delay())
        .with_max_delay(config.retry_max_delay())
        .with_max_times(config.retry_count)
        .with_jitter()
}

/// Determines if a pipeline error is worth retrying.
///
/// Non-retryable:
/// - [`Canceled`]: the caller gave up
/// - [`ValidationError`]: the request itself is invalid and will never pass
/// - [`CircuitOpenError`]: the breaker is refusing calls
pub fn is_retryable(error: &BoxError) -> bool {
    !(error.is::<Canceled>() || error.is::<ValidationError>() || error.is::<CircuitOpenError>())
}
