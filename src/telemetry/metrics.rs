//! OTel-native metrics for dispatch lifecycle.
//!
//! All instruments are lazily initialized on first use against the global
//! meter provider. Naming follows OTel semantic conventions (dot-separated).

use std::sync::LazyLock;
use std::time::Duration;

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::{global, KeyValue};

use crate::dispatch::DispatchKind;
use crate::interfaces::{LifecycleHooks, Outcome};

static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("conduit"));

/// Duration of a whole dispatch (send, publish, stream lifetime).
pub static DISPATCH_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("conduit.dispatch.duration")
        .with_description("Mediator dispatch duration")
        .with_unit("s")
        .build()
});

/// Total dispatches finished.
pub static DISPATCH_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("conduit.dispatch.total")
        .with_description("Total mediator dispatches")
        .build()
});

/// Duration of individual handler invocations.
pub static HANDLER_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("conduit.handler.duration")
        .with_description("Handler invocation duration")
        .with_unit("s")
        .build()
});

/// Create a dispatch kind label.
pub fn kind_attr(kind: DispatchKind) -> KeyValue {
    KeyValue::new("kind", kind.to_string())
}

/// Create an outcome label.
pub fn outcome_attr(outcome: &Outcome<'_>) -> KeyValue {
    KeyValue::new("outcome", outcome.label())
}

/// Create a handler label.
pub fn handler_attr(handler: &str) -> KeyValue {
    KeyValue::new("handler", handler.to_string())
}

/// Records dispatch and handler metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsHooks;

impl LifecycleHooks for MetricsHooks {
    fn on_handler_outcome(&self, handler_type: &str, elapsed: Duration, outcome: Outcome<'_>) {
        HANDLER_DURATION.record(
            elapsed.as_secs_f64(),
            &[handler_attr(handler_type), outcome_attr(&outcome)],
        );
    }

    fn on_dispatch_end(&self, kind: DispatchKind, elapsed: Duration, outcome: Outcome<'_>) {
        let attrs = [kind_attr(kind), outcome_attr(&outcome)];
        DISPATCH_DURATION.record(elapsed.as_secs_f64(), &attrs);
        DISPATCH_TOTAL.add(1, &attrs);
    }
}
