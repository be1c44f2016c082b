//! Conduit - in-process mediator.
//!
//! Routes typed requests to exactly one handler, fans notifications out to
//! zero or more handlers, and streams lazily produced items, running an
//! ordered chain of pipeline behaviors around each call.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use conduit::{Mediator, Request, RequestHandler, ServiceRegistry, BoxError};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Ping(String);
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait::async_trait]
//! impl RequestHandler<Ping> for PingHandler {
//!     async fn handle(&self, request: &Ping, _cancel: &CancellationToken) -> Result<String, BoxError> {
//!         Ok(format!("Hello, {}", request.0))
//!     }
//! }
//!
//! async fn example() -> conduit::Result<()> {
//!     let registry = ServiceRegistry::new().request_handler::<Ping, _>(PingHandler);
//!     let mediator = Mediator::new(Arc::new(registry));
//!     assert_eq!(mediator.send(Ping("x".into())).await?, "Hello, x");
//!     Ok(())
//! }
//! ```

pub mod behaviors;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod interfaces;
pub mod mediator;
pub mod message;
pub mod pipeline;
pub mod registry;
pub mod telemetry;
pub mod utils;

// Re-export main types at crate root
pub use dispatch::{DispatchCache, DispatchKind};
pub use error::{BoxError, Canceled, MediatorError, NotificationFailures, Result};
pub use interfaces::{
    Capability, CapabilityKind, CapabilityResolver, ItemStream, LifecycleHooks, Next,
    NotificationHandler, Outcome, PipelineBehavior, RequestHandler, StreamNext,
    StreamPipelineBehavior, StreamRequestHandler,
};
pub use mediator::{Mediator, MediatorBuilder, MediatorOptions, MediatorStream, PublishStrategy};
pub use message::{Notification, Request, StreamRequest};
pub use registry::ServiceRegistry;

// Cancellation token threaded through every dispatch.
pub use tokio_util::sync::CancellationToken;
