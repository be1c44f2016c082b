//! Pipeline behavior interfaces and continuations.
//!
//! A behavior wraps everything registered after it plus the handler. It gets
//! that remainder as a continuation and decides whether to run it, run it
//! once, or run it several times.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::message::{Request, StreamRequest};

/// Lazy, single-pass sequence of stream items.
pub type ItemStream<T> = BoxStream<'static, Result<T, BoxError>>;

type NextFn<T> = dyn Fn() -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync;
type StreamNextFn<T> = dyn Fn() -> ItemStream<T> + Send + Sync;

/// Continuation bound to the remainder of a request pipeline.
///
/// Cheap to clone. Each [`run`](Next::run) executes the remainder afresh.
pub struct Next<T> {
    inner: Arc<NextFn<T>>,
}

impl<T: Send + 'static> Next<T> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move || f().boxed()),
        }
    }

    /// Execute the rest of the pipeline.
    pub fn run(&self) -> BoxFuture<'static, Result<T, BoxError>> {
        (self.inner)()
    }
}

impl<T> Clone for Next<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Next<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Continuation bound to the remainder of a stream pipeline.
pub struct StreamNext<T> {
    inner: Arc<StreamNextFn<T>>,
}

impl<T: Send + 'static> StreamNext<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> ItemStream<T> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Obtain the inner sequence. Nothing is produced until it is polled.
    pub fn run(&self) -> ItemStream<T> {
        (self.inner)()
    }
}

impl<T> Clone for StreamNext<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for StreamNext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamNext").finish_non_exhaustive()
    }
}

/// Cross-cutting interceptor around a request handler.
///
/// # Example
///
/// ```ignore
/// struct Timing;
///
/// #[async_trait]
/// impl<R: Request> PipelineBehavior<R> for Timing {
///     async fn handle(&self, _request: &R, _cancel: &CancellationToken, next: Next<R::Response>)
///         -> Result<R::Response, BoxError>
///     {
///         let started = Instant::now();
///         let response = next.run().await;
///         info!(elapsed_ms = started.elapsed().as_millis() as u64, "request done");
///         response
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    async fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
        next: Next<R::Response>,
    ) -> Result<R::Response, BoxError>;
}

/// Cross-cutting interceptor around a stream handler.
///
/// Implementations must stay lazy: adapt the stream returned by `next.run()`
/// with combinators instead of draining it.
pub trait StreamPipelineBehavior<R: StreamRequest>: Send + Sync + 'static {
    fn handle(
        &self,
        request: Arc<R>,
        cancel: CancellationToken,
        next: StreamNext<R::Item>,
    ) -> ItemStream<R::Item>;
}
