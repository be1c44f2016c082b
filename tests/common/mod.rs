//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conduit::{
    BoxError, CancellationToken, ItemStream, Notification, NotificationHandler, Request,
    RequestHandler, StreamRequest, StreamRequestHandler,
};
use futures::stream::{self, StreamExt};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Boom(pub String);

/// Request answered with a greeting.
pub struct Greet(pub String);

impl Request for Greet {
    type Response = String;
}

pub struct GreetHandler {
    pub calls: Arc<AtomicUsize>,
}

impl GreetHandler {
    pub fn new(calls: &Arc<AtomicUsize>) -> Self {
        Self {
            calls: Arc::clone(calls),
        }
    }
}

#[async_trait]
impl RequestHandler<Greet> for GreetHandler {
    async fn handle(&self, request: &Greet, _: &CancellationToken) -> Result<String, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Hello, {}", request.0))
    }
}

/// Notification with a shared ordered journal.
pub struct OrderPlaced;

impl Notification for OrderPlaced {}

pub type Journal = Arc<Mutex<Vec<String>>>;

/// Records its name, optionally after a delay, or fails.
pub struct Recorder {
    pub name: &'static str,
    pub delay: Duration,
    pub fail: bool,
    pub journal: Journal,
}

impl Recorder {
    pub fn ok(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            delay: Duration::ZERO,
            fail: false,
            journal: Arc::clone(journal),
        }
    }

    pub fn failing(name: &'static str, journal: &Journal) -> Self {
        Self {
            fail: true,
            ..Self::ok(name, journal)
        }
    }

    pub fn slow(name: &'static str, delay: Duration, journal: &Journal) -> Self {
        Self {
            delay,
            ..Self::ok(name, journal)
        }
    }
}

#[async_trait]
impl NotificationHandler<OrderPlaced> for Recorder {
    async fn handle(&self, _: &OrderPlaced, _: &CancellationToken) -> Result<(), BoxError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(Box::new(Boom(format!("{} failed", self.name))));
        }
        self.journal.lock().unwrap().push(self.name.to_string());
        Ok(())
    }
}

/// Stream of `count` integers starting at `start`.
pub struct Range {
    pub start: i64,
    pub count: usize,
}

impl StreamRequest for Range {
    type Item = i64;
}

pub struct RangeHandler;

impl StreamRequestHandler<Range> for RangeHandler {
    fn handle(&self, request: Arc<Range>, cancel: CancellationToken) -> ItemStream<i64> {
        let start = request.start;
        stream::iter(0..request.count)
            .map(move |i| {
                if cancel.is_cancelled() {
                    return Err(Box::new(conduit::Canceled) as BoxError);
                }
                Ok(start + i as i64)
            })
            .boxed()
    }
}
