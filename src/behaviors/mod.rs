//! Stock pipeline behaviors.
//!
//! Ordinary [`PipelineBehavior`](crate::PipelineBehavior) implementations
//! built on the public contract; register them like any other behavior.
//!
//! - [`PreProcessingBehavior`] / [`PostProcessingBehavior`] - side work before
//!   or after the rest of the pipeline
//! - [`ValidationBehavior`] - collect every rule failure, reject before the handler
//! - [`ResilienceBehavior`] - retry with backoff, per-attempt timeout, circuit breaker

pub mod processing;
pub mod resilience;
pub mod validation;

pub use processing::{
    PostProcessingBehavior, PreProcessingBehavior, RequestPostProcessor, RequestPreProcessor,
};
pub use resilience::{
    CircuitBreaker, CircuitOpenError, ResilienceBehavior, ResilienceConfig, TimeoutError,
};
pub use validation::{ValidationBehavior, ValidationError, ValidationFailure, Validator};
