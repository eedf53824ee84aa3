//! In-memory read cache of orders.
//!
//! The cache is the query-side view of the store: every successfully
//! persisted order is placed here, and at startup the whole store is copied
//! in by [`crate::services::restore_cache`]. There is no eviction.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::Order;

/// Keyed map of orders shared between the ingest path and the query path.
///
/// Orders are handed out as `Arc<Order>`; callers that need to modify one
/// clone it first, so a cached entry never changes after `set`.
pub trait OrderCache: Send + Sync {
    /// Insert or replace the order under `order_uid`.
    fn set(&self, order_uid: &str, order: Arc<Order>);

    fn get(&self, order_uid: &str) -> Option<Arc<Order>>;

    fn delete(&self, order_uid: &str);

    fn size(&self) -> usize;

    /// Copy of the current contents, independent of later mutations.
    fn snapshot(&self) -> HashMap<String, Arc<Order>>;
}

/// `OrderCache` backed by a reader-writer locked `HashMap`.
#[derive(Default)]
pub struct InMemoryOrderCache {
    orders: RwLock<HashMap<String, Arc<Order>>>,
}

impl InMemoryOrderCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderCache for InMemoryOrderCache {
    fn set(&self, order_uid: &str, order: Arc<Order>) {
        self.orders.write().insert(order_uid.to_string(), order);
    }

    fn get(&self, order_uid: &str) -> Option<Arc<Order>> {
        self.orders.read().get(order_uid).cloned()
    }

    fn delete(&self, order_uid: &str) {
        self.orders.write().remove(order_uid);
    }

    fn size(&self) -> usize {
        self.orders.read().len()
    }

    fn snapshot(&self) -> HashMap<String, Arc<Order>> {
        self.orders.read().clone()
    }
}
