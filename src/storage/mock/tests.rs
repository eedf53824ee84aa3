use futures::TryStreamExt;

use super::*;
use crate::model::fixtures::sample_order;

#[tokio::test]
async fn test_mock_persist_and_load_all() {
    let store = MockOrderStore::new();

    store.persist(&sample_order("a")).await.unwrap();
    store.persist(&sample_order("b")).await.unwrap();

    let loaded: Vec<Order> = store.load_all().try_collect().await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(store.persist_calls(), 2);
}

#[tokio::test]
async fn test_mock_persist_replaces_existing() {
    let store = MockOrderStore::new();
    let mut order = sample_order("replace");
    store.persist(&order).await.unwrap();

    order.items.clear();
    store.persist(&order).await.unwrap();

    assert_eq!(store.stored_count().await, 1);
    assert!(store.get_stored("replace").await.unwrap().items.is_empty());
}

#[tokio::test]
async fn test_mock_fail_on_persist() {
    let store = MockOrderStore::new();
    store.set_fail_on_persist(true).await;

    let result = store.persist(&sample_order("fail")).await;

    assert!(matches!(result, Err(StorageError::Unavailable(_))));
    assert_eq!(store.stored_count().await, 0);
    assert_eq!(store.persist_calls(), 1);
}

#[tokio::test]
async fn test_mock_fail_on_load() {
    let store = MockOrderStore::with_orders([sample_order("x")]);
    store.set_fail_on_load(true).await;

    let result: Result<Vec<Order>> = store.load_all().try_collect().await;

    assert!(result.is_err());
}
