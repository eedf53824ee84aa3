//! Ingest handler: delivers bus payloads to the order pipeline.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::bus::{BusError, MessageHandler};
use crate::services::{OrderService, ServiceError};

/// Bridges `MessageBus` deliveries to `OrderService::handle_message`.
pub struct IngestHandler {
    service: Arc<dyn OrderService>,
}

impl IngestHandler {
    pub fn new(service: Arc<dyn OrderService>) -> Self {
        Self { service }
    }
}

impl MessageHandler for IngestHandler {
    fn handle(&self, payload: Bytes) -> BoxFuture<'static, Result<(), BusError>> {
        let service = self.service.clone();

        Box::pin(async move {
            service
                .handle_message(&payload)
                .await
                .map_err(BusError::from)
        })
    }
}

/// Decode and validation failures are rejected so the bus drops the
/// message; persistence failures are redelivered.
impl From<ServiceError> for BusError {
    fn from(err: ServiceError) -> Self {
        if err.is_retryable() {
            BusError::HandlerFailed(err.to_string())
        } else {
            BusError::Rejected(err.to_string())
        }
    }
}
