//! Ingestion pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{OrderService, Result, ServiceError};
use crate::cache::OrderCache;
use crate::model::Order;
use crate::storage::{persist_within, OrderStore};

/// Default bound on a single `persist` call.
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Decode, validate, persist, then cache.
///
/// The cache is only written after the store commits, so a cached order is
/// always one that would survive a restart.
pub struct OrderPipeline {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
    persist_timeout: Duration,
}

impl OrderPipeline {
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        Self {
            store,
            cache,
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
        }
    }

    /// Override the deadline applied to each `persist`.
    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }
}

#[async_trait]
impl OrderService for OrderPipeline {
    #[tracing::instrument(name = "pipeline.handle_message", skip_all, fields(bytes = payload.len()))]
    async fn handle_message(&self, payload: &[u8]) -> Result<()> {
        let order = Order::decode(payload).map_err(|e| {
            let err = ServiceError::from(e);
            warn!(error = %err, "Rejected order payload");
            err
        })?;

        if let Err(e) = persist_within(self.store.as_ref(), &order, self.persist_timeout).await {
            warn!(order_uid = %order.order_uid, error = %e, "Failed to persist order");
            return Err(e.into());
        }

        let order_uid = order.order_uid.clone();
        let items = order.items.len();
        self.cache.set(&order_uid, Arc::new(order));

        info!(order_uid = %order_uid, items, "Order processed");
        Ok(())
    }

    fn get_order(&self, order_uid: &str) -> Result<Arc<Order>> {
        self.cache
            .get(order_uid)
            .ok_or_else(|| ServiceError::NotFound(order_uid.to_string()))
    }

    fn cache_size(&self) -> usize {
        self.cache.size()
    }
}
