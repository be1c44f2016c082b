//! Mediator options.

use std::fmt;

use serde::Deserialize;

/// How `publish` runs the handlers of one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStrategy {
    /// All handlers run concurrently on the caller's task.
    #[default]
    Parallel,
    /// Handlers run in order; every handler runs, failures are collected.
    Sequential,
    /// Handlers run in order; the first failure stops the rest.
    StopOnFirstException,
}

impl fmt::Display for PublishStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStrategy::Parallel => "parallel",
            PublishStrategy::Sequential => "sequential",
            PublishStrategy::StopOnFirstException => "stop_on_first_exception",
        };
        f.write_str(name)
    }
}

/// Mediator-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediatorOptions {
    /// Strategy used by `publish` when none is given per call.
    pub publish_strategy: PublishStrategy,
    /// When false, lifecycle hooks are not installed.
    pub enable_telemetry: bool,
}

impl Default for MediatorOptions {
    fn default() -> Self {
        Self {
            publish_strategy: PublishStrategy::Parallel,
            enable_telemetry: true,
        }
    }
}
