//! Streaming dispatch through the public API.

use std::sync::Arc;

use conduit::{
    CancellationToken, ItemStream, Mediator, ServiceRegistry, StreamNext, StreamPipelineBehavior,
};
use futures::StreamExt;

use crate::common::{Range, RangeHandler};

/// Keeps only even items.
struct EvensOnly;

impl StreamPipelineBehavior<Range> for EvensOnly {
    fn handle(
        &self,
        _request: Arc<Range>,
        _cancel: CancellationToken,
        next: StreamNext<i64>,
    ) -> ItemStream<i64> {
        next.run()
            .filter(|item| futures::future::ready(!matches!(item, Ok(v) if v % 2 != 0)))
            .boxed()
    }
}

#[tokio::test]
async fn test_stream_collects_range_once() {
    let mediator = Mediator::new(Arc::new(
        ServiceRegistry::new().stream_handler::<Range, _>(RangeHandler),
    ));

    let stream = mediator.create_stream(Range { start: 5, count: 3 }).unwrap();
    let items: Vec<i64> = stream.map(|item| item.unwrap()).collect().await;

    assert_eq!(items, vec![5, 6, 7]);
}

#[tokio::test]
async fn test_stream_behavior_filters_lazily() {
    let registry = ServiceRegistry::new()
        .stream_handler::<Range, _>(RangeHandler)
        .stream_behavior::<Range, _>(EvensOnly);
    let mediator = Mediator::new(Arc::new(registry));

    let items: Vec<i64> = mediator
        .create_stream(Range { start: 0, count: 6 })
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(items, vec![0, 2, 4]);
}

#[tokio::test]
async fn test_each_create_stream_starts_fresh() {
    let mediator = Mediator::new(Arc::new(
        ServiceRegistry::new().stream_handler::<Range, _>(RangeHandler),
    ));

    let mut first = mediator.create_stream(Range { start: 1, count: 2 }).unwrap();
    assert_eq!(first.next().await.unwrap().unwrap(), 1);
    drop(first);

    let second: Vec<i64> = mediator
        .create_stream(Range { start: 1, count: 2 })
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
        .await;
    assert_eq!(second, vec![1, 2]);
}

#[tokio::test]
async fn test_cancel_between_items() {
    let mediator = Mediator::new(Arc::new(
        ServiceRegistry::new().stream_handler::<Range, _>(RangeHandler),
    ));
    let cancel = CancellationToken::new();
    let mut stream = mediator
        .create_stream_with(Range { start: 0, count: 100 }, cancel.clone())
        .unwrap();

    let mut seen = 0;
    while let Some(item) = stream.next().await {
        match item {
            Ok(_) => {
                seen += 1;
                if seen == 3 {
                    cancel.cancel();
                }
            }
            Err(e) => {
                assert!(e.is_canceled());
                break;
            }
        }
    }

    assert_eq!(seen, 3);
    assert!(stream.next().await.is_none());
}
