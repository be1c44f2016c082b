//! Pre- and post-processing behaviors.
//!
//! Run side work before the rest of the pipeline sees a request, or after a
//! response comes back, without touching the handler.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::BoxError;
use crate::interfaces::{Next, PipelineBehavior};
use crate::message::Request;

/// Work done before a request reaches the rest of its pipeline.
#[async_trait]
pub trait RequestPreProcessor<R: Request>: Send + Sync + 'static {
    async fn process(&self, request: &R, cancel: &CancellationToken) -> Result<(), BoxError>;
}

/// Work done after a response is produced.
///
/// Only runs on success; a failed pipeline skips post-processing.
#[async_trait]
pub trait RequestPostProcessor<R: Request>: Send + Sync + 'static {
    async fn process(
        &self,
        request: &R,
        response: &R::Response,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError>;
}

/// Runs every pre-processor in order, then the rest of the pipeline.
///
/// A failing pre-processor aborts the request.
pub struct PreProcessingBehavior<R: Request> {
    processors: Vec<Arc<dyn RequestPreProcessor<R>>>,
}

impl<R: Request> PreProcessingBehavior<R> {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn with(mut self, processor: impl RequestPreProcessor<R>) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }
}

impl<R: Request> Default for PreProcessingBehavior<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for PreProcessingBehavior<R> {
    async fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
        next: Next<R::Response>,
    ) -> Result<R::Response, BoxError> {
        for processor in &self.processors {
            processor.process(request, cancel).await?;
        }
        debug!(
            processors = self.processors.len(),
            request_type = std::any::type_name::<R>(),
            "Pre-processing complete"
        );
        next.run().await
    }
}

/// Runs the rest of the pipeline, then every post-processor in order.
pub struct PostProcessingBehavior<R: Request> {
    processors: Vec<Arc<dyn RequestPostProcessor<R>>>,
}

impl<R: Request> PostProcessingBehavior<R> {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn with(mut self, processor: impl RequestPostProcessor<R>) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }
}

impl<R: Request> Default for PostProcessingBehavior<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for PostProcessingBehavior<R> {
    async fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
        next: Next<R::Response>,
    ) -> Result<R::Response, BoxError> {
        let response = next.run().await?;
        for processor in &self.processors {
            processor.process(request, &response, cancel).await?;
        }
        Ok(response)
    }
}
