//! Abstract interfaces for conduit components.
//!
//! These traits define the contracts for:
//! - Handlers (request, notification, stream)
//! - Pipeline behaviors and their continuations
//! - Capability resolution (where handlers and behaviors come from)
//! - Lifecycle hooks (observability sink)

pub mod behavior;
pub mod handler;
pub mod hooks;
pub mod resolver;

pub use behavior::{ItemStream, Next, PipelineBehavior, StreamNext, StreamPipelineBehavior};
pub use handler::{NotificationHandler, RequestHandler, StreamRequestHandler};
pub use hooks::{LifecycleHooks, Outcome};
pub use resolver::{instance, Capability, CapabilityKind, CapabilityResolver, Instance};
