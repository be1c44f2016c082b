//! The mediator: request, notification and stream dispatch.
//!
//! A [`Mediator`] owns a capability resolver, a dispatch cache and optional
//! lifecycle hooks. It is cheap to clone and safe to share between tasks;
//! clones share the cache.
//!
//! - [`Mediator::send`]: exactly one handler, wrapped in pipeline behaviors
//! - [`Mediator::publish`]: zero or more handlers under a [`PublishStrategy`]
//! - [`Mediator::create_stream`]: lazy, cancellable item sequence

mod options;
mod publish;
mod send;
mod stream;

pub use options::{MediatorOptions, PublishStrategy};
pub use stream::MediatorStream;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::dispatch::DispatchCache;
use crate::interfaces::{CapabilityResolver, LifecycleHooks};
use crate::telemetry::{CompositeHooks, TracingHooks};

/// In-process dispatcher.
#[derive(Clone)]
pub struct Mediator {
    resolver: Arc<dyn CapabilityResolver>,
    cache: Arc<DispatchCache>,
    hooks: Option<Arc<dyn LifecycleHooks>>,
    options: MediatorOptions,
}

impl Mediator {
    /// Mediator with default options, a private cache and no hooks.
    pub fn new(resolver: Arc<dyn CapabilityResolver>) -> Self {
        Self::builder(resolver).build()
    }

    pub fn builder(resolver: Arc<dyn CapabilityResolver>) -> MediatorBuilder {
        MediatorBuilder::new(resolver)
    }

    /// Mediator configured from loaded [`Config`].
    ///
    /// Installs [`TracingHooks`] unless telemetry is disabled.
    pub fn from_config(resolver: Arc<dyn CapabilityResolver>, config: &Config) -> Self {
        Self::builder(resolver)
            .with_options(config.mediator.clone())
            .with_tracing()
            .build()
    }

    /// The dispatch cache, for inspection or sharing with another mediator.
    pub fn cache(&self) -> &Arc<DispatchCache> {
        &self.cache
    }

    pub fn options(&self) -> &MediatorOptions {
        &self.options
    }

    pub(crate) fn hooks(&self) -> Option<&Arc<dyn LifecycleHooks>> {
        self.hooks.as_ref()
    }

    pub(crate) fn resolver(&self) -> &dyn CapabilityResolver {
        self.resolver.as_ref()
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("options", &self.options)
            .field("cache", &self.cache)
            .field("hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Mediator`].
pub struct MediatorBuilder {
    resolver: Arc<dyn CapabilityResolver>,
    cache: Option<Arc<DispatchCache>>,
    hooks: Vec<Arc<dyn LifecycleHooks>>,
    options: MediatorOptions,
}

impl MediatorBuilder {
    pub fn new(resolver: Arc<dyn CapabilityResolver>) -> Self {
        Self {
            resolver,
            cache: None,
            hooks: Vec::new(),
            options: MediatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MediatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Default strategy for [`Mediator::publish`].
    pub fn publish_strategy(mut self, strategy: PublishStrategy) -> Self {
        self.options.publish_strategy = strategy;
        self
    }

    /// Share an existing cache instead of creating a private one.
    pub fn with_cache(mut self, cache: Arc<DispatchCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Add a lifecycle hook sink. Sinks are called in the order added.
    pub fn with_hooks(mut self, hooks: Arc<dyn LifecycleHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    /// Add the `tracing` event sink.
    pub fn with_tracing(self) -> Self {
        self.with_hooks(Arc::new(TracingHooks))
    }

    pub fn build(self) -> Mediator {
        let hooks = if self.options.enable_telemetry {
            CompositeHooks::combine(self.hooks)
        } else {
            if !self.hooks.is_empty() {
                debug!(
                    sinks = self.hooks.len(),
                    "Telemetry disabled, lifecycle hooks not installed"
                );
            }
            None
        };

        Mediator {
            resolver: self.resolver,
            cache: self.cache.unwrap_or_default(),
            hooks,
            options: self.options,
        }
    }
}
