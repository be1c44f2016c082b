//! Error types for mediator dispatch.

use crate::dispatch::DispatchKind;

/// Error raised by handlers and behaviors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for mediator operations.
pub type Result<T> = std::result::Result<T, MediatorError>;

/// Marker error for handlers and behaviors that observed cancellation.
///
/// Returning it from a handler surfaces as [`MediatorError::Canceled`] rather
/// than as a handler failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, thiserror::Error)]
#[error("operation canceled")]
pub struct Canceled;

/// Errors that can occur while dispatching a message.
#[derive(Debug, thiserror::Error)]
pub enum MediatorError {
    /// No handler is registered for a request or stream request.
    #[error("No {kind} handler registered for {request_type}")]
    NoHandler {
        kind: DispatchKind,
        request_type: &'static str,
    },

    /// More than one handler is registered where exactly one is required.
    #[error(
        "Multiple {kind} handlers ({count}) registered for {request_type}; \
         ensure a single handler or use distinct request types"
    )]
    AmbiguousHandler {
        kind: DispatchKind,
        request_type: &'static str,
        count: usize,
    },

    /// Error raised by a handler or behavior, passed through untouched.
    #[error(transparent)]
    Handler(BoxError),

    /// Every failure of a publish that ran more than one failing handler.
    #[error(transparent)]
    Aggregate(#[from] NotificationFailures),

    /// The dispatch observed its cancellation signal.
    #[error("dispatch canceled")]
    Canceled,
}

impl MediatorError {
    /// Classify an error raised inside the pipeline.
    ///
    /// The [`Canceled`] marker becomes [`MediatorError::Canceled`]; everything
    /// else is kept as the original error.
    pub fn from_handler(error: BoxError) -> Self {
        if error.is::<Canceled>() {
            MediatorError::Canceled
        } else {
            MediatorError::Handler(error)
        }
    }

    /// Downcast the original handler error to a concrete type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            MediatorError::Handler(e) => e.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Take the original handler error out, or give `self` back.
    pub fn into_inner(self) -> std::result::Result<BoxError, Self> {
        match self {
            MediatorError::Handler(e) => Ok(e),
            other => Err(other),
        }
    }

    /// Returns the aggregated publish failures if this is an aggregate.
    pub fn failures(&self) -> Option<&NotificationFailures> {
        match self {
            MediatorError::Aggregate(f) => Some(f),
            _ => None,
        }
    }

    /// Returns true if no handler was found.
    pub fn is_no_handler(&self) -> bool {
        matches!(self, MediatorError::NoHandler { .. })
    }

    /// Returns true if several handlers were found where one is required.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, MediatorError::AmbiguousHandler { .. })
    }

    /// Returns true if the dispatch was canceled.
    pub fn is_canceled(&self) -> bool {
        matches!(self, MediatorError::Canceled)
    }

    /// Returns true if this is a configuration defect rather than a data error.
    pub fn is_configuration_error(&self) -> bool {
        self.is_no_handler() || self.is_ambiguous()
    }
}

/// Ordered failures collected from a notification publish.
#[derive(Debug, thiserror::Error)]
#[error("{} notification handler(s) failed: {}", .errors.len(), summarize(.errors))]
pub struct NotificationFailures {
    errors: Vec<BoxError>,
}

impl NotificationFailures {
    /// Wrap failures in the order they occurred.
    pub fn new(errors: Vec<BoxError>) -> Self {
        Self { errors }
    }

    /// Individual failures, in order.
    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    /// Number of failed handlers.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the aggregate, yielding the individual failures.
    pub fn into_errors(self) -> Vec<BoxError> {
        self.errors
    }
}

fn summarize(errors: &[BoxError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
