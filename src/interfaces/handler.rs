//! Handler interfaces.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::behavior::ItemStream;
use crate::error::BoxError;
use crate::message::{Notification, Request, StreamRequest};

/// The single authoritative implementation of a request.
///
/// Exactly one instance must be resolvable per request type.
///
/// # Example
///
/// ```ignore
/// struct GetBalance { account: u64 }
/// impl Request for GetBalance { type Response = i64; }
///
/// struct GetBalanceHandler { ledger: Arc<Ledger> }
///
/// #[async_trait]
/// impl RequestHandler<GetBalance> for GetBalanceHandler {
///     async fn handle(&self, request: &GetBalance, _cancel: &CancellationToken) -> Result<i64, BoxError> {
///         Ok(self.ledger.balance(request.account).await?)
///     }
/// }
/// ```
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Produce the response for `request`.
    ///
    /// Check `cancel` at natural suspension points; returning
    /// [`Canceled`](crate::Canceled) reports the call as canceled.
    async fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, BoxError>;

    /// Name reported to lifecycle hooks.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// One of any number of reactions to a notification.
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync + 'static {
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), BoxError>;

    /// Name reported to lifecycle hooks.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Producer of a lazy item sequence for a stream request.
///
/// The returned stream must not do work until polled, and should check
/// `cancel` before producing each element.
pub trait StreamRequestHandler<R: StreamRequest>: Send + Sync + 'static {
    fn handle(&self, request: Arc<R>, cancel: CancellationToken) -> ItemStream<R::Item>;

    /// Name reported to lifecycle hooks.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
