//! Concurrent dispatch integration tests.
//!
//! Many tasks racing through the first dispatch of a type must leave exactly
//! one cached plan and all get correct answers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use conduit::dispatch::DispatchKey;
use conduit::{Mediator, ServiceRegistry};
use tokio::sync::Barrier;

use crate::common::{Greet, GreetHandler, Journal, OrderPlaced, Recorder};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_send_populates_cache_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ServiceRegistry::new().request_handler::<Greet, _>(GreetHandler::new(&calls));
    let mediator = Mediator::new(Arc::new(registry));

    let num_concurrent = 16;
    let barrier = Arc::new(Barrier::new(num_concurrent));
    let mut handles = Vec::new();

    for i in 0..num_concurrent {
        let mediator = mediator.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            mediator.send(Greet(format!("caller-{i}"))).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response, format!("Hello, caller-{i}"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), num_concurrent);
    assert_eq!(mediator.cache().len(), 1);
    assert!(mediator.cache().contains(&DispatchKey::request::<Greet>()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publish_from_many_tasks() {
    let journal = Journal::default();
    let registry = ServiceRegistry::new()
        .notification_handler::<OrderPlaced, _>(Recorder::ok("a", &journal))
        .notification_handler::<OrderPlaced, _>(Recorder::ok("b", &journal));
    let mediator = Mediator::new(Arc::new(registry));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let mediator = mediator.clone();
            tokio::spawn(async move { mediator.publish(OrderPlaced).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(journal.lock().unwrap().len(), 16);
    assert_eq!(mediator.cache().len(), 1);
}
