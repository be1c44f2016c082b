//! Resilience behavior: retry, per-attempt timeout and circuit breaker.
//!
//! Each attempt runs the rest of the pipeline through `next`. Retries use an
//! exponential backoff built by [`utils::retry::backoff`](crate::utils::retry::backoff).

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{BoxError, Canceled};
use crate::interfaces::{Next, PipelineBehavior};
use crate::message::Request;
use crate::utils::retry;

/// Resilience settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Retries after the first attempt. Zero disables retrying.
    pub retry_count: usize,
    /// First backoff delay in milliseconds; doubles per retry.
    pub retry_base_delay_ms: u64,
    /// Upper bound for a single backoff delay in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Per-attempt time limit in milliseconds.
    pub timeout_ms: Option<u64>,
    pub circuit_breaker_enabled: bool,
    /// Consecutive failures that open the circuit.
    pub circuit_breaker_failures: u32,
    /// How long the circuit stays open, in milliseconds.
    pub circuit_breaker_duration_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry_count: 0,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 10_000,
            timeout_ms: None,
            circuit_breaker_enabled: false,
            circuit_breaker_failures: 5,
            circuit_breaker_duration_ms: 30_000,
        }
    }
}

impl ResilienceConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn circuit_breaker_duration(&self) -> Duration {
        Duration::from_millis(self.circuit_breaker_duration_ms)
    }
}

/// An attempt exceeded its time limit.
#[derive(Debug, Clone, thiserror::Error)]
#[error("attempt timed out after {limit:?}")]
pub struct TimeoutError {
    pub limit: Duration,
}

/// The circuit is open; the pipeline was not invoked.
#[derive(Debug, Clone, thiserror::Error)]
#[error("circuit open, retry after {retry_after:?}")]
pub struct CircuitOpenError {
    pub retry_after: Duration,
}

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    open_until: Option<Instant>,
    half_open: bool,
    trial_in_flight: bool,
}

/// Consecutive-failure circuit breaker.
///
/// Opens after `threshold` failures in a row. Once the open period has
/// elapsed a single trial call is let through and every other caller is
/// refused until it settles: success closes the circuit, failure opens it
/// again.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    open_for: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, open_for: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            open_for,
            state: Mutex::new(BreakerState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a call, or refuse it while the circuit is open.
    pub fn check(&self) -> Result<(), CircuitOpenError> {
        self.admit().map(|_| ())
    }

    /// Like [`check`](Self::check); `Ok(true)` marks the half-open trial call.
    fn admit(&self) -> Result<bool, CircuitOpenError> {
        let mut state = self.state();
        if let Some(until) = state.open_until {
            let now = Instant::now();
            if now < until {
                return Err(CircuitOpenError {
                    retry_after: until - now,
                });
            }
            state.open_until = None;
            state.half_open = true;
        }
        if !state.half_open {
            return Ok(false);
        }
        if state.trial_in_flight {
            return Err(CircuitOpenError {
                retry_after: Duration::ZERO,
            });
        }
        state.trial_in_flight = true;
        Ok(true)
    }

    /// The trial call ended without an outcome; admit the next caller.
    fn release_trial(&self) {
        self.state().trial_in_flight = false;
    }

    pub fn record_success(&self) {
        let mut state = self.state();
        if state.half_open {
            info!("Circuit closed");
        }
        *state = BreakerState::default();
    }

    pub fn record_failure(&self) {
        let mut state = self.state();
        state.consecutive_failures += 1;
        if state.half_open || state.consecutive_failures >= self.threshold {
            warn!(
                failures = state.consecutive_failures,
                open_for = ?self.open_for,
                "Circuit opened"
            );
            state.open_until = Some(Instant::now() + self.open_for);
            state.half_open = false;
            state.trial_in_flight = false;
            state.consecutive_failures = 0;
        }
    }

    /// Whether calls are currently refused.
    pub fn is_open(&self) -> bool {
        self.state()
            .open_until
            .is_some_and(|until| Instant::now() < until)
    }
}

/// Releases the half-open trial slot if the trial call is canceled or dropped
/// before it records an outcome.
struct Trial<'a>(&'a CircuitBreaker);

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        self.0.release_trial();
    }
}

/// Retries, times out and circuit-breaks the rest of the pipeline.
///
/// Register one instance per request type; the breaker state is shared by
/// every dispatch that resolves the same instance.
pub struct ResilienceBehavior<R> {
    config: ResilienceConfig,
    breaker: Option<Arc<CircuitBreaker>>,
    _request: PhantomData<fn() -> R>,
}

impl<R: Request> ResilienceBehavior<R> {
    pub fn new(config: ResilienceConfig) -> Self {
        let breaker = config.circuit_breaker_enabled.then(|| {
            Arc::new(CircuitBreaker::new(
                config.circuit_breaker_failures,
                config.circuit_breaker_duration(),
            ))
        });
        Self {
            config,
            breaker,
            _request: PhantomData,
        }
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    pub fn breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.breaker.as_ref()
    }

    async fn attempt(&self, next: &Next<R::Response>) -> Result<R::Response, BoxError> {
        let _trial = match &self.breaker {
            Some(breaker) => match breaker.admit() {
                Ok(true) => Some(Trial(breaker)),
                Ok(false) => None,
                Err(open) => return Err(Box::new(open)),
            },
            None => None,
        };

        let result = match self.config.timeout() {
            Some(limit) => match tokio::time::timeout(limit, next.run()).await {
                Ok(result) => result,
                Err(_) => Err(Box::new(TimeoutError { limit }) as BoxError),
            },
            None => next.run().await,
        };

        if let Some(breaker) = &self.breaker {
            match &result {
                Ok(_) => breaker.record_success(),
                Err(e) if !e.is::<Canceled>() => breaker.record_failure(),
                Err(_) => {}
            }
        }
        result
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for ResilienceBehavior<R> {
    async fn handle(
        &self,
        _request: &R,
        cancel: &CancellationToken,
        next: Next<R::Response>,
    ) -> Result<R::Response, BoxError> {
        if self.config.retry_count == 0 {
            return self.attempt(&next).await;
        }

        (|| self.attempt(&next))
            .retry(retry::backoff(&self.config))
            .when(|e| retry::is_retryable(e) && !cancel.is_cancelled())
            .notify(|err: &BoxError, dur: Duration| {
                warn!(
                    request_type = std::any::type_name::<R>(),
                    error = %err,
                    delay = ?dur,
                    "Attempt failed, retrying"
                );
            })
            .await
    }
}
