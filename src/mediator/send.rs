//! Request dispatch.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Mediator;
use crate::dispatch::{DispatchKey, DispatchKind, RequestPlan};
use crate::error::{MediatorError, Result};
use crate::interfaces::hooks::{DispatchSpan, Instrumented};
use crate::interfaces::RequestHandler;
use crate::message::Request;
use crate::pipeline;

impl Mediator {
    /// Dispatch `request` to its single handler through the behavior chain.
    ///
    /// # Errors
    ///
    /// - [`MediatorError::NoHandler`] / [`MediatorError::AmbiguousHandler`]
    ///   when the resolver does not yield exactly one handler
    /// - [`MediatorError::Handler`] carrying the handler's or a behavior's
    ///   own error
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response> {
        self.send_with(request, CancellationToken::new()).await
    }

    /// Like [`send`](Self::send) with a caller-supplied cancellation token.
    pub async fn send_with<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> Result<R::Response> {
        let plan = self
            .cache
            .plan(DispatchKey::request::<R>(), RequestPlan::<R>::compile);
        let span = DispatchSpan::start(
            self.hooks(),
            DispatchKind::Request,
            plan.request_type(),
            plan.response_type(),
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
            "Dispatching request"
        );

        let handler: Arc<dyn RequestHandler<R>> = match self.hooks() {
            Some(hooks) => Arc::new(Instrumented::new(handler, Arc::clone(hooks))),
            None => handler,
        };

        let pipeline = pipeline::compose(handler, behaviors, Arc::new(request), cancel);
        let result = pipeline.run().await.map_err(MediatorError::from_handler);
        span.finish(result)
    }
}
