//! Handler dispatch utilities.
//!
//! Turns handler outcomes into the acknowledgement decision every bus
//! implementation applies to the delivered message.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{error, warn};

use super::{BusError, MessageHandler};

/// Result of processing a message through handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// All handlers succeeded, safe to acknowledge.
    Success,
    /// A handler failed transiently; redeliver.
    Retry,
    /// The payload can never succeed; drop it without redelivery.
    Rejected,
}

impl DispatchResult {
    /// Returns true if the message should be removed from the queue.
    ///
    /// Rejected messages are removed too, since redelivery would fail the
    /// same way forever.
    pub fn should_ack(&self) -> bool {
        matches!(self, Self::Success | Self::Rejected)
    }

    /// Returns true if all handlers succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Dispatch a payload to all registered handlers.
///
/// Calls each handler in sequence, logging errors but continuing to subsequent
/// handlers. A transient failure in any handler wins over a rejection so the
/// message gets another chance.
pub async fn dispatch_to_handlers(
    handlers: &Arc<RwLock<Vec<Arc<dyn MessageHandler>>>>,
    payload: &Bytes,
) -> DispatchResult {
    let handlers_guard = handlers.read().await;
    let mut result = DispatchResult::Success;

    for handler in handlers_guard.iter() {
        match handler.handle(payload.clone()).await {
            Ok(()) => {}
            Err(BusError::Rejected(reason)) => {
                warn!(reason = %reason, "Handler rejected message");
                if result == DispatchResult::Success {
                    result = DispatchResult::Rejected;
                }
            }
            Err(e) => {
                error!(error = %e, "Handler failed");
                result = DispatchResult::Retry;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;

    struct SuccessHandler;
    impl MessageHandler for SuccessHandler {
        fn handle(&self, _payload: Bytes) -> BoxFuture<'static, Result<(), BusError>> {
            Box::pin(async { Ok(()) })
        }
    }

    struct FailHandler;
    impl MessageHandler for FailHandler {
        fn handle(&self, _payload: Bytes) -> BoxFuture<'static, Result<(), BusError>> {
            Box::pin(async { Err(BusError::HandlerFailed("db down".to_string())) })
        }
    }

    struct RejectHandler;
    impl MessageHandler for RejectHandler {
        fn handle(&self, _payload: Bytes) -> BoxFuture<'static, Result<(), BusError>> {
            Box::pin(async { Err(BusError::Rejected("bad json".to_string())) })
        }
    }

    fn handlers(
        list: Vec<Arc<dyn MessageHandler>>,
    ) -> Arc<RwLock<Vec<Arc<dyn MessageHandler>>>> {
        Arc::new(RwLock::new(list))
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let handlers = handlers(vec![Arc::new(SuccessHandler)]);
        let payload = Bytes::from_static(b"{}");

        assert_eq!(
            dispatch_to_handlers(&handlers, &payload).await,
            DispatchResult::Success
        );
    }

    #[tokio::test]
    async fn test_dispatch_failure_retries() {
        let handlers = handlers(vec![Arc::new(FailHandler)]);
        let payload = Bytes::from_static(b"{}");

        assert_eq!(
            dispatch_to_handlers(&handlers, &payload).await,
            DispatchResult::Retry
        );
    }

    #[tokio::test]
    async fn test_dispatch_rejection() {
        let handlers = handlers(vec![Arc::new(RejectHandler)]);
        let payload = Bytes::from_static(b"{}");

        assert_eq!(
            dispatch_to_handlers(&handlers, &payload).await,
            DispatchResult::Rejected
        );
    }

    #[tokio::test]
    async fn test_dispatch_retry_wins_over_rejection() {
        let handlers = handlers(vec![
            Arc::new(RejectHandler),
            Arc::new(FailHandler),
            Arc::new(SuccessHandler), // Should still be called
        ]);
        let payload = Bytes::from_static(b"{}");

        assert_eq!(
            dispatch_to_handlers(&handlers, &payload).await,
            DispatchResult::Retry
        );
    }

    #[tokio::test]
    async fn test_dispatch_no_handlers_is_success() {
        let handlers = handlers(vec![]);
        let payload = Bytes::from_static(b"{}");

        assert!(dispatch_to_handlers(&handlers, &payload).await.is_success());
    }

    #[test]
    fn test_dispatch_result_should_ack() {
        assert!(DispatchResult::Success.should_ack());
        assert!(DispatchResult::Rejected.should_ack());
        assert!(!DispatchResult::Retry.should_ack());
    }
}
