//! Pipeline composition.
//!
//! Folds an ordered list of behaviors around a handler into one continuation.
//! Behaviors `[b0, b1, .., bn]` compose to `b0(b1(..bn(handler)..))`, so the
//! first registered behavior is outermost. Composition performs no work; the
//! returned continuation runs the chain each time it is invoked.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::interfaces::{
    Next, PipelineBehavior, RequestHandler, StreamNext, StreamPipelineBehavior,
    StreamRequestHandler,
};
use crate::message::{Request, StreamRequest};

/// Compose a request pipeline.
pub fn compose<R: Request>(
    handler: Arc<dyn RequestHandler<R>>,
    behaviors: Vec<Arc<dyn PipelineBehavior<R>>>,
    request: Arc<R>,
    cancel: CancellationToken,
) -> Next<R::Response> {
    let innermost = {
        let request = Arc::clone(&request);
        let cancel = cancel.clone();
        Next::new(move || {
            let handler = Arc::clone(&handler);
            let request = Arc::clone(&request);
            let cancel = cancel.clone();
            async move { handler.handle(&request, &cancel).await }
        })
    };

    behaviors.into_iter().rev().fold(innermost, |next, behavior| {
        let request = Arc::clone(&request);
        let cancel = cancel.clone();
        Next::new(move || {
            let behavior = Arc::clone(&behavior);
            let request = Arc::clone(&request);
            let cancel = cancel.clone();
            let next = next.clone();
            async move { behavior.handle(&request, &cancel, next).await }
        })
    })
}

/// Compose a stream pipeline. Nothing is produced until the stream is polled.
pub fn compose_stream<R: StreamRequest>(
    handler: Arc<dyn StreamRequestHandler<R>>,
    behaviors: Vec<Arc<dyn StreamPipelineBehavior<R>>>,
    request: Arc<R>,
    cancel: CancellationToken,
) -> StreamNext<R::Item> {
    let innermost = {
        let request = Arc::clone(&request);
        let cancel = cancel.clone();
        StreamNext::new(move || handler.handle(Arc::clone(&request), cancel.clone()))
    };

    behaviors.into_iter().rev().fold(innermost, |next, behavior| {
        let request = Arc::clone(&request);
        let cancel = cancel.clone();
        StreamNext::new(move || {
            behavior.handle(Arc::clone(&request), cancel.clone(), next.clone())
        })
    })
}
