//! Lifecycle hook sinks.
//!
//! - [`TracingHooks`] - structured `tracing` events per dispatch and handler
//! - [`CompositeHooks`] - fan one hook call out to several sinks
//! - `MetricsHooks` - OpenTelemetry instruments (feature `otel`)

#[cfg(feature = "otel")]
pub mod metrics;

#[cfg(feature = "otel")]
pub use metrics::MetricsHooks;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::dispatch::DispatchKind;
use crate::interfaces::{LifecycleHooks, Outcome};
use crate::mediator::PublishStrategy;

/// Emits `tracing` events at dispatch boundaries.
///
/// Successes log at `debug`, failures at `warn`, per-handler timings at
/// `trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHooks;

impl LifecycleHooks for TracingHooks {
    fn on_dispatch_start(&self, kind: DispatchKind, request_type: &str, response_type: &str) {
        debug!(%kind, request_type, response_type, "Dispatch started");
    }

    fn on_publish(&self, notification_type: &str, handler_count: usize, strategy: PublishStrategy) {
        debug!(notification_type, handler_count, %strategy, "Publishing");
    }

    fn on_handler_outcome(&self, handler_type: &str, elapsed: Duration, outcome: Outcome<'_>) {
        match outcome.error() {
            None => trace!(
                handler_type,
                elapsed_us = elapsed.as_micros() as u64,
                "Handler completed"
            ),
            Some(e) => warn!(
                handler_type,
                elapsed_us = elapsed.as_micros() as u64,
                error = %e,
                "Handler failed"
            ),
        }
    }

    fn on_dispatch_end(&self, kind: DispatchKind, elapsed: Duration, outcome: Outcome<'_>) {
        match outcome.error() {
            None => debug!(%kind, elapsed_us = elapsed.as_micros() as u64, "Dispatch completed"),
            Some(e) => warn!(
                %kind,
                elapsed_us = elapsed.as_micros() as u64,
                error = %e,
                "Dispatch failed"
            ),
        }
    }
}

/// Forwards every hook call to each sink in order.
#[derive(Clone, Default)]
pub struct CompositeHooks {
    sinks: Vec<Arc<dyn LifecycleHooks>>,
}

impl CompositeHooks {
    pub fn new(sinks: Vec<Arc<dyn LifecycleHooks>>) -> Self {
        Self { sinks }
    }

    /// Collapse a sink list: none, the single sink itself, or a composite.
    pub fn combine(mut sinks: Vec<Arc<dyn LifecycleHooks>>) -> Option<Arc<dyn LifecycleHooks>> {
        match sinks.len() {
            0 => None,
            1 => sinks.pop(),
            _ => Some(Arc::new(Self::new(sinks))),
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LifecycleHooks for CompositeHooks {
    fn on_dispatch_start(&self, kind: DispatchKind, request_type: &str, response_type: &str) {
        for sink in &self.sinks {
            sink.on_dispatch_start(kind, request_type, response_type);
        }
    }

    fn on_publish(&self, notification_type: &str, handler_count: usize, strategy: PublishStrategy) {
        for sink in &self.sinks {
            sink.on_publish(notification_type, handler_count, strategy);
        }
    }

    fn on_handler_outcome(&self, handler_type: &str, elapsed: Duration, outcome: Outcome<'_>) {
        for sink in &self.sinks {
            sink.on_handler_outcome(handler_type, elapsed, outcome);
        }
    }

    fn on_dispatch_end(&self, kind: DispatchKind, elapsed: Duration, outcome: Outcome<'_>) {
        for sink in &self.sinks {
            sink.on_dispatch_end(kind, elapsed, outcome);
        }
    }
}
