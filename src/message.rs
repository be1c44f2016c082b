//! Message contracts: requests, notifications and stream requests.
//!
//! A message's Rust type is its identity for dispatch. Handlers and behaviors
//! are looked up by the message type together with its declared output type.

/// A single-answer operation with a declared response type.
///
/// Use `()` as the response for commands with nothing to return.
pub trait Request: Send + Sync + 'static {
    /// Value produced by the request's handler.
    type Response: Send + Sync + 'static;
}

/// A fan-out event with no response. May have any number of handlers.
pub trait Notification: Send + Sync + 'static {}

/// An operation whose result is a lazy sequence of items.
pub trait StreamRequest: Send + Sync + 'static {
    /// Element type of the produced sequence.
    type Item: Send + 'static;
}
