//! Stream dispatch.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Mediator;
use crate::dispatch::{DispatchKey, DispatchKind, StreamPlan};
use crate::error::{MediatorError, Result};
use crate::interfaces::hooks::DispatchSpan;
use crate::interfaces::{ItemStream, Outcome};
use crate::message::StreamRequest;
use crate::pipeline;

impl Mediator {
    /// Resolve the stream pipeline for `request` and return its lazy output.
    ///
    /// Resolution errors are returned here; nothing runs until the stream is
    /// polled.
    pub fn create_stream<R: StreamRequest>(&self, request: R) -> Result<MediatorStream<R::Item>> {
        self.create_stream_with(request, CancellationToken::new())
    }

    /// Like [`create_stream`](Self::create_stream) with a caller-supplied
    /// cancellation token.
    pub fn create_stream_with<R: StreamRequest>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> Result<MediatorStream<R::Item>> {
        let plan = self
            .cache
            .plan(DispatchKey::stream::<R>(), StreamPlan::<R>::compile);
        let span = DispatchSpan::start(
            self.hooks(),
            DispatchKind::Stream,
            plan.request_type(),
            plan.item_type(),
        );

        if cancel.is_cancelled() {
            return span.finish(Err(MediatorError::Canceled));
        }

        let (handler, behaviors) = match plan.resolve(self.resolver()) {
            Ok(resolved) => resolved,
            Err(e) => return span.finish(Err(e)),
        };
        debug!(
            request_type = plan.request_type(),
            handler = handler.name(),
            behaviors = behaviors.len(),
            "Opening stream"
        );

        let next = pipeline::compose_stream(handler, behaviors, Arc::new(request), cancel.clone());
        Ok(MediatorStream::new(next.run(), cancel, span))
    }
}

/// Lazy, single-pass, fused sequence returned by [`Mediator::create_stream`].
///
/// Ends after the first error. Once the cancellation token fires, yields one
/// [`MediatorError::Canceled`] and ends. Dropping it stops production and
/// reports the dispatch as finished.
pub struct MediatorStream<T> {
    inner: Option<ItemStream<T>>,
    cancel: CancellationToken,
    span: Option<DispatchSpan>,
}

impl<T> MediatorStream<T> {
    fn new(inner: ItemStream<T>, cancel: CancellationToken, span: DispatchSpan) -> Self {
        Self {
            inner: Some(inner),
            cancel,
            span: Some(span),
        }
    }

    fn terminate(&mut self, outcome: Outcome<'_>) {
        self.inner = None;
        if let Some(span) = self.span.take() {
            span.end(outcome);
        }
    }

    fn fail(&mut self, error: MediatorError) -> Poll<Option<Result<T>>> {
        self.terminate(Outcome::Failure(&error));
        Poll::Ready(Some(Err(error)))
    }
}

impl<T> Stream for MediatorStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        if this.cancel.is_cancelled() {
            return this.fail(MediatorError::Canceled);
        }

        match inner.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(e))) => this.fail(MediatorError::from_handler(e)),
            Poll::Ready(None) => {
                this.terminate(Outcome::Success);
                Poll::Ready(None)
            }
        }
    }
}

impl<T> FusedStream for MediatorStream<T> {
    fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}

impl<T> fmt::Debug for MediatorStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediatorStream")
            .field("terminated", &self.inner.is_none())
            .field("canceled", &self.cancel.is_cancelled())
            .finish()
    }
}
