//! Cache warm-up from the durable store.

use std::sync::Arc;

use futures::TryStreamExt;
use tracing::info;

use crate::cache::OrderCache;
use crate::storage::{OrderStore, Result};

/// Copy every stored order into the cache.
///
/// Orders are inserted in the order the store yields them. The first load
/// error aborts the restore and is returned; orders inserted before it stay
/// in the cache. Returns the number of orders restored.
pub async fn restore_cache(store: &dyn OrderStore, cache: &dyn OrderCache) -> Result<usize> {
    let mut orders = store.load_all();
    let mut restored = 0;

    while let Some(order) = orders.try_next().await? {
        let order_uid = order.order_uid.clone();
        cache.set(&order_uid, Arc::new(order));
        restored += 1;
    }

    info!(restored, "Cache restored from store");
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryOrderCache;
    use crate::model::fixtures::sample_order;
    use crate::storage::{MockOrderStore, StorageError};

    #[tokio::test]
    async fn test_restore_cache_loads_every_order() {
        let orders: Vec<_> = (0..5).map(|i| sample_order(&format!("o-{}", i))).collect();
        let store = MockOrderStore::with_orders(orders.clone());
        let cache = InMemoryOrderCache::new();

        let restored = restore_cache(&store, &cache).await.unwrap();

        assert_eq!(restored, 5);
        for order in &orders {
            assert_eq!(cache.get(&order.order_uid).as_deref(), Some(order));
        }
    }

    #[tokio::test]
    async fn test_restore_cache_empty_store() {
        let store = MockOrderStore::new();
        let cache = InMemoryOrderCache::new();

        assert_eq!(restore_cache(&store, &cache).await.unwrap(), 0);
        assert_eq!(cache.size(), 0);
    }

    #[tokio::test]
    async fn test_restore_cache_surfaces_load_error() {
        let store = MockOrderStore::with_orders([sample_order("x")]);
        store.set_fail_on_load(true).await;
        let cache = InMemoryOrderCache::new();

        let err = restore_cache(&store, &cache).await.unwrap_err();

        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
