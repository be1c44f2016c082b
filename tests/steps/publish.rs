//! Publish strategy step definitions.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use conduit::{
    BoxError, CancellationToken, Mediator, MediatorError, Notification, NotificationHandler,
    PublishStrategy, ServiceRegistry,
};
use cucumber::{given, then, when, World};

#[derive(Debug)]
struct OrderShipped;

impl Notification for OrderShipped {}

type Journal = Arc<Mutex<Vec<String>>>;

/// Handler that appends its name to the journal or fails.
struct NamedHandler {
    name: String,
    fail: bool,
    journal: Journal,
}

#[async_trait]
impl NotificationHandler<OrderShipped> for NamedHandler {
    async fn handle(&self, _: &OrderShipped, _: &CancellationToken) -> Result<(), BoxError> {
        if self.fail {
            return Err(format!("{} failed", self.name).into());
        }
        self.journal.lock().unwrap().push(self.name.clone());
        Ok(())
    }
}

/// Test context for publish strategy scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct PublishWorld {
    handlers: Vec<(String, bool)>,
    journal: Journal,
    result: Option<Result<(), MediatorError>>,
}

impl PublishWorld {
    fn new() -> Self {
        Self {
            handlers: Vec::new(),
            journal: Journal::default(),
            result: None,
        }
    }

    fn error(&self) -> &MediatorError {
        match &self.result {
            Some(Err(e)) => e,
            other => panic!("expected a failed publish, got {other:?}"),
        }
    }

    fn ran(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
}

fn names(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_string()).collect()
}

fn strategy(name: &str) -> PublishStrategy {
    match name {
        "parallel" => PublishStrategy::Parallel,
        "sequential" => PublishStrategy::Sequential,
        "stop_on_first_exception" => PublishStrategy::StopOnFirstException,
        other => panic!("unknown strategy {other}"),
    }
}

// --- Given steps ---

#[given(expr = "a handler {string} that succeeds")]
async fn given_succeeding_handler(world: &mut PublishWorld, name: String) {
    world.handlers.push((name, false));
}

#[given(expr = "a handler {string} that fails")]
async fn given_failing_handler(world: &mut PublishWorld, name: String) {
    world.handlers.push((name, true));
}

// --- When steps ---

#[when(expr = "the notification is published with the {string} strategy")]
async fn when_published(world: &mut PublishWorld, name: String) {
    let registry = world
        .handlers
        .iter()
        .fold(ServiceRegistry::new(), |registry, (name, fail)| {
            registry.notification_handler::<OrderShipped, _>(NamedHandler {
                name: name.clone(),
                fail: *fail,
                journal: Arc::clone(&world.journal),
            })
        });
    let mediator = Mediator::new(Arc::new(registry));

    world.result = Some(
        mediator
            .publish_with(OrderShipped, strategy(&name), CancellationToken::new())
            .await,
    );
}

// --- Then steps ---

#[then("the publish succeeds")]
async fn then_succeeds(world: &mut PublishWorld) {
    assert!(
        matches!(world.result, Some(Ok(()))),
        "expected success, got {:?}",
        world.result
    );
}

#[then(expr = "the publish fails with {string}")]
async fn then_fails_with(world: &mut PublishWorld, message: String) {
    let err = world.error();
    assert!(err.failures().is_none(), "expected an unwrapped error: {err}");
    assert_eq!(err.to_string(), message);
}

#[then(expr = "the publish fails with an aggregate of {int} failures")]
async fn then_fails_with_aggregate(world: &mut PublishWorld, count: usize) {
    let failures = world.error().failures().expect("aggregate error");
    assert_eq!(failures.len(), count);
}

#[then(expr = "the failures are {string}")]
async fn then_failures_are(world: &mut PublishWorld, list: String) {
    let failures = world.error().failures().expect("aggregate error");
    let messages: Vec<String> = failures.errors().iter().map(|e| e.to_string()).collect();
    assert_eq!(messages, names(&list));
}

#[then(expr = "handlers {string} have run")]
async fn then_handlers_ran(world: &mut PublishWorld, list: String) {
    let mut ran = world.ran();
    let mut expected = names(&list);
    ran.sort();
    expected.sort();
    assert_eq!(ran, expected);
}

#[then(expr = "the handlers ran in the order {string}")]
async fn then_ran_in_order(world: &mut PublishWorld, list: String) {
    assert_eq!(world.ran(), names(&list));
}

#[then(expr = "handler {string} has not run")]
async fn then_not_run(world: &mut PublishWorld, name: String) {
    assert!(!world.ran().contains(&name));
}
