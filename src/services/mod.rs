//! Order ingestion and query services.
//!
//! - `OrderPipeline`: decode → validate → persist → cache for each inbound
//!   payload, plus the read path used by the HTTP layer
//! - `restore_cache`: warms the cache from the store at startup

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{ModelError, Order, ValidationError};
use crate::storage::StorageError;

pub mod pipeline;
pub mod restore;

pub use pipeline::OrderPipeline;
pub use restore::restore_cache;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the order service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to unmarshal order: {0}")]
    MalformedPayload(serde_json::Error),

    #[error("invalid order: {0}")]
    Validation(ValidationError),

    #[error("failed to save order: {0}")]
    Persistence(#[from] StorageError),

    #[error("order not found: {0}")]
    NotFound(String),
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Malformed(e) => ServiceError::MalformedPayload(e),
            ModelError::Validation(e) => ServiceError::Validation(e),
        }
    }
}

impl ServiceError {
    /// Whether redelivering the same payload could succeed.
    ///
    /// Only persistence failures are transient; a payload that failed to
    /// decode or validate fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Persistence(_))
    }
}

/// Ingest and query interface over orders.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Process one inbound payload.
    ///
    /// Returns `Ok(())` only when the order has been durably persisted and
    /// placed in the cache; callers acknowledge the message after that.
    async fn handle_message(&self, payload: &[u8]) -> Result<()>;

    /// Look up an order in the cache.
    fn get_order(&self, order_uid: &str) -> Result<Arc<Order>>;

    fn cache_size(&self) -> usize;
}
