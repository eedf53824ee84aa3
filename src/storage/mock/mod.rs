//! Mock OrderStore implementation for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tokio::sync::RwLock;

use super::{OrderStore, Result, StorageError};
use crate::model::Order;

/// Mock order store that keeps orders in memory.
///
/// `persist` replaces the whole entity graph for the order, mirroring the
/// upsert-and-replace-items semantics of the SQL stores.
#[derive(Default)]
pub struct MockOrderStore {
    orders: RwLock<HashMap<String, Order>>,
    fail_on_persist: RwLock<bool>,
    fail_on_load: RwLock<bool>,
    persist_delay: RwLock<Option<Duration>>,
    persist_calls: AtomicUsize,
}

impl MockOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given orders.
    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let orders = orders
            .into_iter()
            .map(|order| (order.order_uid.clone(), order))
            .collect();
        Self {
            orders: RwLock::new(orders),
            ..Self::default()
        }
    }

    pub async fn set_fail_on_persist(&self, fail: bool) {
        *self.fail_on_persist.write().await = fail;
    }

    pub async fn set_fail_on_load(&self, fail: bool) {
        *self.fail_on_load.write().await = fail;
    }

    /// Sleep this long before each write.
    pub async fn set_persist_delay(&self, delay: Duration) {
        *self.persist_delay.write().await = Some(delay);
    }

    pub async fn get_stored(&self, order_uid: &str) -> Option<Order> {
        self.orders.read().await.get(order_uid).cloned()
    }

    pub async fn stored_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Number of `persist` calls, including failed ones.
    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn persist(&self, order: &Order) -> Result<()> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.persist_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_on_persist.read().await {
            return Err(StorageError::Unavailable(
                "mock persist failure".to_string(),
            ));
        }

        self.orders
            .write()
            .await
            .insert(order.order_uid.clone(), order.clone());
        Ok(())
    }

    fn load_all(&self) -> BoxStream<'_, Result<Order>> {
        stream::once(async move {
            if *self.fail_on_load.read().await {
                return stream::iter(vec![Err(StorageError::Unavailable(
                    "mock load failure".to_string(),
                ))]);
            }

            let orders: Vec<Result<Order>> =
                self.orders.read().await.values().cloned().map(Ok).collect();
            stream::iter(orders)
        })
        .flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests;
