//! Lifecycle hooks.
//!
//! Observability sink the dispatchers report to. Hooks never affect control
//! flow; when none are installed the mediator makes no hook calls at all.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::handler::{NotificationHandler, RequestHandler};
use crate::dispatch::DispatchKind;
use crate::error::{BoxError, MediatorError};
use crate::mediator::PublishStrategy;
use crate::message::{Notification, Request};

/// Outcome of a handler invocation or a whole dispatch.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Success,
    Failure(&'a (dyn std::error::Error + 'static)),
}

impl<'a> Outcome<'a> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn error(&self) -> Option<&'a (dyn std::error::Error + 'static)> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(e) => Some(*e),
        }
    }

    /// Short label for logs and metric attributes.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure(_) => "error",
        }
    }

    pub(crate) fn of_result<T>(result: &'a Result<T, MediatorError>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) => Outcome::Failure(e),
        }
    }

    pub(crate) fn of_handler<T>(result: &'a Result<T, BoxError>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) => Outcome::Failure(e.as_ref()),
        }
    }
}

/// Observer of dispatch boundaries.
///
/// Every method defaults to a no-op so sinks implement only what they need.
pub trait LifecycleHooks: Send + Sync {
    /// A send, publish or stream dispatch began.
    fn on_dispatch_start(&self, _kind: DispatchKind, _request_type: &str, _response_type: &str) {}

    /// A publish resolved its handlers and is about to run them.
    fn on_publish(&self, _notification_type: &str, _handler_count: usize, _strategy: PublishStrategy) {
    }

    /// A single handler finished.
    fn on_handler_outcome(&self, _handler_type: &str, _elapsed: Duration, _outcome: Outcome<'_>) {}

    /// A dispatch finished, successfully or not.
    fn on_dispatch_end(&self, _kind: DispatchKind, _elapsed: Duration, _outcome: Outcome<'_>) {}
}

/// Reports the start and end of one dispatch.
///
/// Dropped without [`end`](Self::end), as when the caller abandons the
/// dispatch future, it reports the dispatch as finished without error.
pub(crate) struct DispatchSpan {
    hooks: Option<Arc<dyn LifecycleHooks>>,
    kind: DispatchKind,
    started: Instant,
}

impl DispatchSpan {
    pub(crate) fn start(
        hooks: Option<&Arc<dyn LifecycleHooks>>,
        kind: DispatchKind,
        request_type: &str,
        response_type: &str,
    ) -> Self {
        if let Some(h) = hooks {
            h.on_dispatch_start(kind, request_type, response_type);
        }
        Self {
            hooks: hooks.cloned(),
            kind,
            started: Instant::now(),
        }
    }

    pub(crate) fn end(mut self, outcome: Outcome<'_>) {
        self.report(outcome);
    }

    pub(crate) fn finish<T>(self, result: Result<T, MediatorError>) -> Result<T, MediatorError> {
        self.end(Outcome::of_result(&result));
        result
    }

    // Single-shot: the hooks are taken on first report.
    fn report(&mut self, outcome: Outcome<'_>) {
        if let Some(hooks) = self.hooks.take() {
            hooks.on_dispatch_end(self.kind, self.started.elapsed(), outcome);
        }
    }
}

impl Drop for DispatchSpan {
    fn drop(&mut self) {
        self.report(Outcome::Success);
    }
}

/// Times one handler call; reports on drop if the call never completed.
struct HandlerSpan<'a> {
    hooks: Option<&'a Arc<dyn LifecycleHooks>>,
    name: &'static str,
    started: Instant,
}

impl<'a> HandlerSpan<'a> {
    fn start(hooks: &'a Arc<dyn LifecycleHooks>, name: &'static str) -> Self {
        Self {
            hooks: Some(hooks),
            name,
            started: Instant::now(),
        }
    }

    fn finish<T>(mut self, result: Result<T, BoxError>) -> Result<T, BoxError> {
        self.report(Outcome::of_handler(&result));
        result
    }

    fn report(&mut self, outcome: Outcome<'_>) {
        if let Some(hooks) = self.hooks.take() {
            hooks.on_handler_outcome(self.name, self.started.elapsed(), outcome);
        }
    }
}

impl Drop for HandlerSpan<'_> {
    fn drop(&mut self) {
        self.report(Outcome::Success);
    }
}

/// Handler decorator reporting per-handler elapsed time and outcome.
pub(crate) struct Instrumented<H: ?Sized> {
    inner: Arc<H>,
    hooks: Arc<dyn LifecycleHooks>,
}

impl<H: ?Sized> Instrumented<H> {
    pub(crate) fn new(inner: Arc<H>, hooks: Arc<dyn LifecycleHooks>) -> Self {
        Self { inner, hooks }
    }
}

#[async_trait]
impl<R: Request> RequestHandler<R> for Instrumented<dyn RequestHandler<R>> {
    async fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError> {
        let span = HandlerSpan::start(&self.hooks, self.inner.name());
        span.finish(self.inner.handle(request, cancel).await)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[async_trait]
impl<N: Notification> NotificationHandler<N> for Instrumented<dyn NotificationHandler<N>> {
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), BoxError> {
        let span = HandlerSpan::start(&self.hooks, self.inner.name());
        span.finish(self.inner.handle(notification, cancel).await)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
