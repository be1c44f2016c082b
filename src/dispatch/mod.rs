//! Dispatch plans and the per-type-pair plan cache.
//!
//! A plan is the type-specific part of a dispatch that never changes for a
//! given message type: which capabilities to ask the resolver for and how to
//! validate what comes back. Plans are built once per (kind, message, output)
//! triple and cached; handler instances are still resolved on every call.

mod cache;

pub use cache::DispatchCache;

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{MediatorError, Result};
use crate::interfaces::resolver::{self, Capability, CapabilityResolver};
use crate::interfaces::{
    NotificationHandler, PipelineBehavior, RequestHandler, StreamPipelineBehavior,
    StreamRequestHandler,
};
use crate::message::{Notification, Request, StreamRequest};

/// Which dispatcher a plan belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Request,
    Notification,
    Stream,
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchKind::Request => "request",
            DispatchKind::Notification => "notification",
            DispatchKind::Stream => "stream",
        };
        f.write_str(name)
    }
}

/// Cache key: dispatch kind plus message and output types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    kind: DispatchKind,
    message: TypeId,
    output: TypeId,
}

impl DispatchKey {
    pub fn request<R: Request>() -> Self {
        Self {
            kind: DispatchKind::Request,
            message: TypeId::of::<R>(),
            output: TypeId::of::<R::Response>(),
        }
    }

    pub fn notification<N: Notification>() -> Self {
        Self {
            kind: DispatchKind::Notification,
            message: TypeId::of::<N>(),
            output: TypeId::of::<()>(),
        }
    }

    pub fn stream<R: StreamRequest>() -> Self {
        Self {
            kind: DispatchKind::Stream,
            message: TypeId::of::<R>(),
            output: TypeId::of::<R::Item>(),
        }
    }

    pub fn kind(&self) -> DispatchKind {
        self.kind
    }
}

/// Enforce the exactly-one-handler rule.
fn single<T: ?Sized>(
    kind: DispatchKind,
    request_type: &'static str,
    mut handlers: Vec<Arc<T>>,
) -> Result<Arc<T>> {
    match handlers.len() {
        0 => Err(MediatorError::NoHandler { kind, request_type }),
        1 => Ok(handlers.remove(0)),
        count => Err(MediatorError::AmbiguousHandler {
            kind,
            request_type,
            count,
        }),
    }
}

/// Resolution plan for `send`.
pub(crate) struct RequestPlan<R> {
    handler: Capability,
    behaviors: Capability,
    _request: PhantomData<fn() -> R>,
}

impl<R: Request> RequestPlan<R> {
    pub(crate) fn compile() -> Self {
        Self {
            handler: Capability::request_handler::<R>(),
            behaviors: Capability::pipeline_behavior::<R>(),
            _request: PhantomData,
        }
    }

    pub(crate) fn request_type(&self) -> &'static str {
        self.handler.message_name()
    }

    pub(crate) fn response_type(&self) -> &'static str {
        self.handler.output_name()
    }

    /// Resolve the single handler and the behaviors in registration order.
    pub(crate) fn resolve(
        &self,
        resolver: &dyn CapabilityResolver,
    ) -> Result<(Arc<dyn RequestHandler<R>>, Vec<Arc<dyn PipelineBehavior<R>>>)> {
        let handler = single(
            DispatchKind::Request,
            self.request_type(),
            resolver::request_handlers::<R>(resolver, &self.handler),
        )?;
        let behaviors = resolver::pipeline_behaviors::<R>(resolver, &self.behaviors);
        Ok((handler, behaviors))
    }
}

/// Resolution plan for `publish`.
pub(crate) struct NotificationPlan<N> {
    handlers: Capability,
    _notification: PhantomData<fn() -> N>,
}

impl<N: Notification> NotificationPlan<N> {
    pub(crate) fn compile() -> Self {
        Self {
            handlers: Capability::notification_handler::<N>(),
            _notification: PhantomData,
        }
    }

    pub(crate) fn notification_type(&self) -> &'static str {
        self.handlers.message_name()
    }

    /// Every handler, in registration order. May be empty.
    pub(crate) fn resolve(
        &self,
        resolver: &dyn CapabilityResolver,
    ) -> Vec<Arc<dyn NotificationHandler<N>>> {
        resolver::notification_handlers::<N>(resolver, &self.handlers)
    }
}

/// Resolution plan for `create_stream`.
pub(crate) struct StreamPlan<R> {
    handler: Capability,
    behaviors: Capability,
    _request: PhantomData<fn() -> R>,
}

impl<R: StreamRequest> StreamPlan<R> {
    pub(crate) fn compile() -> Self {
        Self {
            handler: Capability::stream_handler::<R>(),
            behaviors: Capability::stream_behavior::<R>(),
            _request: PhantomData,
        }
    }

    pub(crate) fn request_type(&self) -> &'static str {
        self.handler.message_name()
    }

    pub(crate) fn item_type(&self) -> &'static str {
        self.handler.output_name()
    }

    pub(crate) fn resolve(
        &self,
        resolver: &dyn CapabilityResolver,
    ) -> Result<(
        Arc<dyn StreamRequestHandler<R>>,
        Vec<Arc<dyn StreamPipelineBehavior<R>>>,
    )> {
        let handler = single(
            DispatchKind::Stream,
            self.request_type(),
            resolver::stream_handlers::<R>(resolver, &self.handler),
        )?;
        let behaviors = resolver::stream_behaviors::<R>(resolver, &self.behaviors);
        Ok((handler, behaviors))
    }
}
