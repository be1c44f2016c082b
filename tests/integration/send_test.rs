//! Request dispatch through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use conduit::config::Config;
use conduit::interfaces::Instance;
use conduit::{Capability, CapabilityResolver, Mediator, MediatorError, ServiceRegistry};

use crate::common::{Greet, GreetHandler};

#[tokio::test]
async fn test_send_through_registry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ServiceRegistry::new().request_handler::<Greet, _>(GreetHandler::new(&calls));
    let mediator = Mediator::new(Arc::new(registry));

    assert_eq!(mediator.send(Greet("Ada".into())).await.unwrap(), "Hello, Ada");
    assert_eq!(mediator.send(Greet("Bob".into())).await.unwrap(), "Hello, Bob");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_factory_registration_builds_handler_per_send() {
    let calls = Arc::new(AtomicUsize::new(0));
    let built = Arc::new(AtomicUsize::new(0));
    let (calls_ref, built_ref) = (Arc::clone(&calls), Arc::clone(&built));
    let registry = ServiceRegistry::new().request_handler_factory::<Greet, _, _>(move || {
        built_ref.fetch_add(1, Ordering::SeqCst);
        GreetHandler::new(&calls_ref)
    });
    let mediator = Mediator::new(Arc::new(registry));

    mediator.send(Greet("a".into())).await.unwrap();
    mediator.send(Greet("b".into())).await.unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert_eq!(mediator.cache().len(), 1);
}

#[tokio::test]
async fn test_missing_handler_is_configuration_error() {
    let mediator = Mediator::new(Arc::new(ServiceRegistry::new()));

    let err = mediator.send(Greet("x".into())).await.unwrap_err();

    assert!(err.is_configuration_error());
    assert!(matches!(err, MediatorError::NoHandler { .. }));
}

/// Resolver that hands out instances of the wrong type.
struct Mismatched;

impl CapabilityResolver for Mismatched {
    fn resolve(&self, _capability: &Capability) -> Vec<Instance> {
        vec![Arc::new("not a handler") as Instance]
    }
}

#[tokio::test]
async fn test_foreign_instances_are_ignored() {
    let mediator = Mediator::new(Arc::new(Mismatched));

    let err = mediator.send(Greet("x".into())).await.unwrap_err();

    assert!(err.is_no_handler());
}

#[tokio::test]
async fn test_from_config_applies_options() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ServiceRegistry::new().request_handler::<Greet, _>(GreetHandler::new(&calls));
    let config = Config::from_yaml("mediator:\n  publish_strategy: sequential\n").unwrap();

    let mediator = Mediator::from_config(Arc::new(registry), &config);

    assert_eq!(
        mediator.options().publish_strategy,
        conduit::PublishStrategy::Sequential
    );
    assert_eq!(mediator.send(Greet("cfg".into())).await.unwrap(), "Hello, cfg");
}

#[tokio::test]
async fn test_shared_cache_between_mediators() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(
        ServiceRegistry::new().request_handler::<Greet, _>(GreetHandler::new(&calls)),
    );
    let first = Mediator::new(registry.clone());
    let second = Mediator::builder(registry)
        .with_cache(Arc::clone(first.cache()))
        .build();

    first.send(Greet("a".into())).await.unwrap();

    assert_eq!(second.cache().len(), 1);
    assert!(Arc::ptr_eq(first.cache(), second.cache()));
}
