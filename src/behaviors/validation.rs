//! Request validation behavior.
//!
//! Runs every validator registered for a request type and short-circuits the
//! pipeline with a [`ValidationError`] listing all failures.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::BoxError;
use crate::interfaces::{Next, PipelineBehavior};
use crate::message::Request;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub property: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

/// Every failure found across all validators of one request.
#[derive(Debug, Clone, thiserror::Error)]
#[error("validation failed: {}", join(.failures))]
pub struct ValidationError {
    failures: Vec<ValidationFailure>,
}

impl ValidationError {
    pub fn new(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }
}

fn join(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rule set for one request type. An empty result means valid.
#[async_trait]
pub trait Validator<R: Request>: Send + Sync + 'static {
    async fn validate(&self, request: &R, cancel: &CancellationToken) -> Vec<ValidationFailure>;
}

/// Runs all validators before the rest of the pipeline.
///
/// With no validators the behavior passes straight through.
pub struct ValidationBehavior<R: Request> {
    validators: Vec<Arc<dyn Validator<R>>>,
}

impl<R: Request> ValidationBehavior<R> {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    pub fn with(mut self, validator: impl Validator<R>) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }
}

impl<R: Request> Default for ValidationBehavior<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for ValidationBehavior<R> {
    async fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
        next: Next<R::Response>,
    ) -> Result<R::Response, BoxError> {
        let mut failures = Vec::new();
        for validator in &self.validators {
            failures.extend(validator.validate(request, cancel).await);
        }

        if !failures.is_empty() {
            debug!(
                request_type = std::any::type_name::<R>(),
                failures = failures.len(),
                "Request rejected by validation"
            );
            return Err(Box::new(ValidationError::new(failures)));
        }

        next.run().await
    }
}
