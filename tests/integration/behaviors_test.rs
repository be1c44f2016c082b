//! Stock behaviors composed in one pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use conduit::behaviors::{
    PostProcessingBehavior, PreProcessingBehavior, RequestPostProcessor, RequestPreProcessor,
    ResilienceBehavior, ResilienceConfig, ValidationBehavior, ValidationError, ValidationFailure,
    Validator,
};
use conduit::{BoxError, CancellationToken, Mediator, Request, RequestHandler, ServiceRegistry};

struct Transfer {
    amount: i64,
}

impl Request for Transfer {
    type Response = i64;
}

/// Fails the first call, then succeeds.
struct TransferHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RequestHandler<Transfer> for TransferHandler {
    async fn handle(&self, request: &Transfer, _: &CancellationToken) -> Result<i64, BoxError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err("ledger busy".into());
        }
        Ok(request.amount)
    }
}

struct PositiveAmount;

#[async_trait]
impl Validator<Transfer> for PositiveAmount {
    async fn validate(&self, request: &Transfer, _: &CancellationToken) -> Vec<ValidationFailure> {
        if request.amount > 0 {
            Vec::new()
        } else {
            vec![ValidationFailure::new("amount", "must be positive")]
        }
    }
}

struct Trail(Arc<Mutex<Vec<String>>>);

#[async_trait]
impl RequestPreProcessor<Transfer> for Trail {
    async fn process(&self, request: &Transfer, _: &CancellationToken) -> Result<(), BoxError> {
        self.0.lock().unwrap().push(format!("begin {}", request.amount));
        Ok(())
    }
}

#[async_trait]
impl RequestPostProcessor<Transfer> for Trail {
    async fn process(
        &self,
        _: &Transfer,
        response: &i64,
        _: &CancellationToken,
    ) -> Result<(), BoxError> {
        self.0.lock().unwrap().push(format!("done {response}"));
        Ok(())
    }
}

fn mediator(calls: &Arc<AtomicUsize>, trail: &Arc<Mutex<Vec<String>>>) -> Mediator {
    let resilience = ResilienceConfig {
        retry_count: 2,
        retry_base_delay_ms: 1,
        ..ResilienceConfig::default()
    };
    let registry = ServiceRegistry::new()
        .request_handler::<Transfer, _>(TransferHandler {
            calls: Arc::clone(calls),
        })
        .behavior::<Transfer, _>(PreProcessingBehavior::new().with(Trail(Arc::clone(trail))))
        .behavior::<Transfer, _>(ValidationBehavior::new().with(PositiveAmount))
        .behavior::<Transfer, _>(ResilienceBehavior::new(resilience))
        .behavior::<Transfer, _>(PostProcessingBehavior::new().with(Trail(Arc::clone(trail))));
    Mediator::builder(Arc::new(registry)).with_tracing().build()
}

#[tokio::test(start_paused = true)]
async fn test_retry_wraps_only_inner_behaviors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let trail = Arc::new(Mutex::new(Vec::new()));

    let response = mediator(&calls, &trail)
        .send(Transfer { amount: 25 })
        .await
        .unwrap();

    assert_eq!(response, 25);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // Pre-processing sits outside the retry, post-processing inside it.
    assert_eq!(*trail.lock().unwrap(), vec!["begin 25", "done 25"]);
}

#[tokio::test]
async fn test_invalid_request_is_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let trail = Arc::new(Mutex::new(Vec::new()));

    let err = mediator(&calls, &trail)
        .send(Transfer { amount: -5 })
        .await
        .unwrap_err();

    let validation = err.downcast_ref::<ValidationError>().expect("validation error");
    assert_eq!(validation.failures()[0].message, "must be positive");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(*trail.lock().unwrap(), vec!["begin -5"]);
}
