//! Capability resolution interface.
//!
//! The mediator never constructs handlers or behaviors. It describes what it
//! needs with a [`Capability`] and asks a [`CapabilityResolver`] for every
//! instance providing it.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use super::behavior::{PipelineBehavior, StreamPipelineBehavior};
use super::handler::{NotificationHandler, RequestHandler, StreamRequestHandler};
use crate::message::{Notification, Request, StreamRequest};

/// Type-erased resolved instance.
///
/// Wraps a typed trait object, e.g. an `Arc<dyn RequestHandler<R>>`.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Kind of component a capability asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    RequestHandler,
    PipelineBehavior,
    NotificationHandler,
    StreamHandler,
    StreamBehavior,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityKind::RequestHandler => "request_handler",
            CapabilityKind::PipelineBehavior => "pipeline_behavior",
            CapabilityKind::NotificationHandler => "notification_handler",
            CapabilityKind::StreamHandler => "stream_handler",
            CapabilityKind::StreamBehavior => "stream_behavior",
        };
        f.write_str(name)
    }
}

/// Descriptor of a capability: component kind plus message and output types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability {
    kind: CapabilityKind,
    message: TypeId,
    output: TypeId,
    message_name: &'static str,
    output_name: &'static str,
}

impl Capability {
    fn of<M: 'static, O: 'static>(kind: CapabilityKind) -> Self {
        Self {
            kind,
            message: TypeId::of::<M>(),
            output: TypeId::of::<O>(),
            message_name: type_name::<M>(),
            output_name: type_name::<O>(),
        }
    }

    pub fn request_handler<R: Request>() -> Self {
        Self::of::<R, R::Response>(CapabilityKind::RequestHandler)
    }

    pub fn pipeline_behavior<R: Request>() -> Self {
        Self::of::<R, R::Response>(CapabilityKind::PipelineBehavior)
    }

    pub fn notification_handler<N: Notification>() -> Self {
        Self::of::<N, ()>(CapabilityKind::NotificationHandler)
    }

    pub fn stream_handler<R: StreamRequest>() -> Self {
        Self::of::<R, R::Item>(CapabilityKind::StreamHandler)
    }

    pub fn stream_behavior<R: StreamRequest>() -> Self {
        Self::of::<R, R::Item>(CapabilityKind::StreamBehavior)
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Type name of the request or notification.
    pub fn message_name(&self) -> &'static str {
        self.message_name
    }

    /// Type name of the response, stream item, or `()` for notifications.
    pub fn output_name(&self) -> &'static str {
        self.output_name
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}<{}, {}>",
            self.kind, self.message_name, self.output_name
        )
    }
}

/// Source of handler and behavior instances.
///
/// Must return instances in a stable order across calls for the same
/// capability. An empty vector means nothing is registered.
pub trait CapabilityResolver: Send + Sync {
    fn resolve(&self, capability: &Capability) -> Vec<Instance>;
}

impl<T: CapabilityResolver + ?Sized> CapabilityResolver for Arc<T> {
    fn resolve(&self, capability: &Capability) -> Vec<Instance> {
        (**self).resolve(capability)
    }
}

/// Wrap a typed trait object for return from a resolver.
pub fn instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
    Arc::new(value)
}

/// Recover typed trait objects, skipping instances of any other type.
pub(crate) fn downcast_all<T: ?Sized + Send + Sync + 'static>(
    instances: Vec<Instance>,
) -> Vec<Arc<T>> {
    instances
        .into_iter()
        .filter_map(|i| i.downcast_ref::<Arc<T>>().cloned())
        .collect()
}

pub(crate) fn request_handlers<R: Request>(
    resolver: &dyn CapabilityResolver,
    capability: &Capability,
) -> Vec<Arc<dyn RequestHandler<R>>> {
    downcast_all(resolver.resolve(capability))
}

pub(crate) fn pipeline_behaviors<R: Request>(
    resolver: &dyn CapabilityResolver,
    capability: &Capability,
) -> Vec<Arc<dyn PipelineBehavior<R>>> {
    downcast_all(resolver.resolve(capability))
}

pub(crate) fn notification_handlers<N: Notification>(
    resolver: &dyn CapabilityResolver,
    capability: &Capability,
) -> Vec<Arc<dyn NotificationHandler<N>>> {
    downcast_all(resolver.resolve(capability))
}

pub(crate) fn stream_handlers<R: StreamRequest>(
    resolver: &dyn CapabilityResolver,
    capability: &Capability,
) -> Vec<Arc<dyn StreamRequestHandler<R>>> {
    downcast_all(resolver.resolve(capability))
}

pub(crate) fn stream_behaviors<R: StreamRequest>(
    resolver: &dyn CapabilityResolver,
    capability: &Capability,
) -> Vec<Arc<dyn StreamPipelineBehavior<R>>> {
    downcast_all(resolver.resolve(capability))
}
