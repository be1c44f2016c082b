//! Notification fan-out.

use std::sync::Arc;

use futures::future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Mediator, PublishStrategy};
use crate::dispatch::{DispatchKey, DispatchKind, NotificationPlan};
use crate::error::{BoxError, MediatorError, NotificationFailures, Result};
use crate::interfaces::hooks::{DispatchSpan, Instrumented};
use crate::interfaces::NotificationHandler;
use crate::message::Notification;

type Handlers<N> = Vec<Arc<dyn NotificationHandler<N>>>;

impl Mediator {
    /// Deliver `notification` to every handler using the configured strategy.
    ///
    /// Zero handlers is not an error.
    pub async fn publish<N: Notification>(&self, notification: N) -> Result<()> {
        self.publish_with(
            notification,
            self.options.publish_strategy,
            CancellationToken::new(),
        )
        .await
    }

    /// Deliver `notification` with an explicit strategy and cancellation token.
    ///
    /// # Errors
    ///
    /// - `Parallel`: a single failure is returned as-is, two or more as
    ///   [`MediatorError::Aggregate`] in registration order
    /// - `Sequential`: any failure yields [`MediatorError::Aggregate`] in the
    ///   order the failures occurred
    /// - `StopOnFirstException`: the first failure, unwrapped
    pub async fn publish_with<N: Notification>(
        &self,
        notification: N,
        strategy: PublishStrategy,
        cancel: CancellationToken,
    ) -> Result<()> {
        let plan = self
            .cache
            .plan(DispatchKey::notification::<N>(), NotificationPlan::<N>::compile);
        let span = DispatchSpan::start(
            self.hooks(),
            DispatchKind::Notification,
            plan.notification_type(),
            "()",
        );

        if cancel.is_cancelled() {
            return span.finish(Err(MediatorError::Canceled));
        }

        let handlers = plan.resolve(self.resolver());
        if let Some(hooks) = self.hooks() {
            hooks.on_publish(plan.notification_type(), handlers.len(), strategy);
        }
        if handlers.is_empty() {
            debug!(
                notification_type = plan.notification_type(),
                "No notification handlers registered"
            );
            return span.finish(Ok(()));
        }
        debug!(
            notification_type = plan.notification_type(),
            handlers = handlers.len(),
            %strategy,
            "Publishing notification"
        );

        let handlers = self.instrument(handlers);
        let result = match strategy {
            PublishStrategy::Parallel => parallel(&handlers, &notification, &cancel).await,
            PublishStrategy::Sequential => sequential(&handlers, &notification, &cancel).await,
            PublishStrategy::StopOnFirstException => {
                stop_on_first(&handlers, &notification, &cancel).await
            }
        };
        span.finish(result)
    }

    fn instrument<N: Notification>(&self, handlers: Handlers<N>) -> Handlers<N> {
        match self.hooks() {
            Some(hooks) => handlers
                .into_iter()
                .map(|h| {
                    Arc::new(Instrumented::new(h, Arc::clone(hooks)))
                        as Arc<dyn NotificationHandler<N>>
                })
                .collect(),
            None => handlers,
        }
    }
}

/// Drive every handler concurrently on the current task.
async fn parallel<N: Notification>(
    handlers: &[Arc<dyn NotificationHandler<N>>],
    notification: &N,
    cancel: &CancellationToken,
) -> Result<()> {
    let outcomes: Vec<std::result::Result<(), BoxError>> = match handlers {
        [] => Vec::new(),
        [only] => vec![only.handle(notification, cancel).await],
        [first, second] => {
            let (a, b) = future::join(
                first.handle(notification, cancel),
                second.handle(notification, cancel),
            )
            .await;
            vec![a, b]
        }
        _ => {
            future::join_all(handlers.iter().map(|h| h.handle(notification, cancel))).await
        }
    };

    let mut failures: Vec<BoxError> = outcomes.into_iter().filter_map(|r| r.err()).collect();
    match failures.len() {
        0 => Ok(()),
        1 => Err(MediatorError::from_handler(failures.remove(0))),
        _ => Err(NotificationFailures::new(failures).into()),
    }
}

/// Run every handler in order, collecting failures.
async fn sequential<N: Notification>(
    handlers: &[Arc<dyn NotificationHandler<N>>],
    notification: &N,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut failures = Vec::new();
    for handler in handlers {
        if let Err(e) = handler.handle(notification, cancel).await {
            warn!(handler = handler.name(), error = %e, "Notification handler failed");
            failures.push(e);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(NotificationFailures::new(failures).into())
    }
}

/// Run handlers in order, stopping at the first failure.
async fn stop_on_first<N: Notification>(
    handlers: &[Arc<dyn NotificationHandler<N>>],
    notification: &N,
    cancel: &CancellationToken,
) -> Result<()> {
    for handler in handlers {
        handler
            .handle(notification, cancel)
            .await
            .map_err(MediatorError::from_handler)?;
    }
    Ok(())
}
