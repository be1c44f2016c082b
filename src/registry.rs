//! In-memory service registry.
//!
//! [`ServiceRegistry`] is the stock [`CapabilityResolver`]: components are
//! registered by message type and returned in registration order. A component
//! registered by value is shared by every dispatch; one registered through a
//! factory is built afresh on each resolve.
//!
//! ```ignore
//! let registry = ServiceRegistry::new()
//!     .request_handler::<CreateOrder, _>(CreateOrderHandler::new(store))
//!     .behavior::<CreateOrder, _>(ValidationBehavior::new().with(OrderValidator))
//!     .notification_handler::<OrderCreated, _>(SendReceipt)
//!     .notification_handler::<OrderCreated, _>(UpdateStock);
//! let mediator = Mediator::new(Arc::new(registry));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::interfaces::resolver::{instance, Instance};
use crate::interfaces::{
    Capability, CapabilityResolver, NotificationHandler, PipelineBehavior, RequestHandler,
    StreamPipelineBehavior, StreamRequestHandler,
};
use crate::message::{Notification, Request, StreamRequest};

type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Registration surface and resolver for handlers and behaviors.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    registrations: HashMap<Capability, Vec<Factory>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn shared<T>(mut self, capability: Capability, value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || instance(Arc::clone(&value)));
        self.registrations.entry(capability).or_default().push(factory);
        self
    }

    fn transient<T, F>(mut self, capability: Capability, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || instance(factory()));
        self.registrations.entry(capability).or_default().push(factory);
        self
    }

    /// Register the handler for request `R`. Shared across dispatches.
    pub fn request_handler<R, H>(self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.shared(Capability::request_handler::<R>(), handler)
    }

    /// Register a factory building a fresh handler for every dispatch of `R`.
    pub fn request_handler_factory<R, H, F>(self, factory: F) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.transient(Capability::request_handler::<R>(), move || {
            Arc::new(factory()) as Arc<dyn RequestHandler<R>>
        })
    }

    /// Append a pipeline behavior for request `R`. Earlier behaviors wrap
    /// later ones.
    pub fn behavior<R, B>(self, behavior: B) -> Self
    where
        R: Request,
        B: PipelineBehavior<R>,
    {
        let behavior: Arc<dyn PipelineBehavior<R>> = Arc::new(behavior);
        self.shared(Capability::pipeline_behavior::<R>(), behavior)
    }

    /// Append a behavior for `R` built afresh on every dispatch.
    pub fn behavior_factory<R, B, F>(self, factory: F) -> Self
    where
        R: Request,
        B: PipelineBehavior<R>,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.transient(Capability::pipeline_behavior::<R>(), move || {
            Arc::new(factory()) as Arc<dyn PipelineBehavior<R>>
        })
    }

    /// Append a handler for notification `N`.
    pub fn notification_handler<N, H>(self, handler: H) -> Self
    where
        N: Notification,
        H: NotificationHandler<N>,
    {
        let handler: Arc<dyn NotificationHandler<N>> = Arc::new(handler);
        self.shared(Capability::notification_handler::<N>(), handler)
    }

    /// Register the handler for stream request `R`.
    pub fn stream_handler<R, H>(self, handler: H) -> Self
    where
        R: StreamRequest,
        H: StreamRequestHandler<R>,
    {
        let handler: Arc<dyn StreamRequestHandler<R>> = Arc::new(handler);
        self.shared(Capability::stream_handler::<R>(), handler)
    }

    /// Append a stream behavior for stream request `R`.
    pub fn stream_behavior<R, B>(self, behavior: B) -> Self
    where
        R: StreamRequest,
        B: StreamPipelineBehavior<R>,
    {
        let behavior: Arc<dyn StreamPipelineBehavior<R>> = Arc::new(behavior);
        self.shared(Capability::stream_behavior::<R>(), behavior)
    }

    /// Number of registrations for `capability`.
    pub fn count(&self, capability: &Capability) -> usize {
        self.registrations.get(capability).map_or(0, Vec::len)
    }
}

impl CapabilityResolver for ServiceRegistry {
    fn resolve(&self, capability: &Capability) -> Vec<Instance> {
        self.registrations
            .get(capability)
            .map(|factories| factories.iter().map(|f| f()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (capability, factories) in &self.registrations {
            map.entry(&capability.to_string(), &factories.len());
        }
        map.finish()
    }
}
