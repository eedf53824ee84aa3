//! OrderStore interface tests.
//!
//! These tests verify the contract of the OrderStore trait.
//! Each storage implementation should run these tests against a freshly
//! initialized schema.

use futures::TryStreamExt;

use order_service::model::fixtures::sample_order;
use order_service::model::{Item, Order};
use order_service::storage::OrderStore;

/// Create a test item with a distinguishing id.
pub fn make_item(chrt_id: i64) -> Item {
    Item {
        chrt_id,
        track_number: "WBILMTESTTRACK".to_string(),
        price: 453,
        rid: format!("rid-{}", chrt_id),
        name: format!("item-{}", chrt_id),
        sale: 30,
        size: "0".to_string(),
        total_price: 317,
        nm_id: 2389212,
        brand: "Vivienne Sabo".to_string(),
        status: 202,
    }
}

/// Load everything and pick out one order.
pub async fn load_one<S: OrderStore>(store: &S, order_uid: &str) -> Option<Order> {
    let orders: Vec<Order> = store
        .load_all()
        .try_collect()
        .await
        .expect("load_all should succeed");
    orders.into_iter().find(|o| o.order_uid == order_uid)
}

// =============================================================================
// OrderStore::persist tests
// =============================================================================

pub async fn test_persist_roundtrip<S: OrderStore>(store: &S) {
    let order = sample_order("test_roundtrip");

    store.persist(&order).await.expect("persist should succeed");

    let loaded = load_one(store, "test_roundtrip").await;
    assert_eq!(loaded, Some(order));
}

pub async fn test_persist_is_idempotent<S: OrderStore>(store: &S) {
    let order = sample_order("test_idempotent");

    store.persist(&order).await.expect("first persist");
    store.persist(&order).await.expect("second persist");

    let loaded = load_one(store, "test_idempotent").await.expect("order stored");
    assert_eq!(loaded.items.len(), 1, "re-ingest must not duplicate items");
    assert_eq!(loaded, order);
}

pub async fn test_persist_replaces_items<S: OrderStore>(store: &S) {
    let mut order = sample_order("test_replace_items");
    order.items = vec![make_item(1), make_item(2), make_item(3)];
    store.persist(&order).await.expect("persist three items");

    order.items = vec![make_item(9)];
    store.persist(&order).await.expect("persist one item");

    let loaded = load_one(store, "test_replace_items").await.expect("order stored");
    assert_eq!(loaded.items, vec![make_item(9)]);
}

pub async fn test_persist_preserves_item_order<S: OrderStore>(store: &S) {
    let mut order = sample_order("test_item_order");
    order.items = vec![make_item(30), make_item(10), make_item(20)];

    store.persist(&order).await.expect("persist should succeed");

    let loaded = load_one(store, "test_item_order").await.expect("order stored");
    let ids: Vec<i64> = loaded.items.iter().map(|i| i.chrt_id).collect();
    assert_eq!(ids, vec![30, 10, 20]);
}

pub async fn test_persist_empty_items<S: OrderStore>(store: &S) {
    let mut order = sample_order("test_empty_items");
    order.items.clear();

    store.persist(&order).await.expect("persist should succeed");

    let loaded = load_one(store, "test_empty_items").await.expect("order stored");
    assert!(loaded.items.is_empty());
}

pub async fn test_persist_updates_scalar_fields<S: OrderStore>(store: &S) {
    let mut order = sample_order("test_update_fields");
    store.persist(&order).await.expect("first persist");

    order.track_number = "UPDATED".to_string();
    order.delivery.city = "Moscow".to_string();
    order.payment.amount = 42;
    store.persist(&order).await.expect("second persist");

    let loaded = load_one(store, "test_update_fields").await.expect("order stored");
    assert_eq!(loaded.track_number, "UPDATED");
    assert_eq!(loaded.delivery.city, "Moscow");
    assert_eq!(loaded.payment.amount, 42);
}

// =============================================================================
// OrderStore::load_all tests
// =============================================================================

pub async fn test_load_all_returns_every_order<S: OrderStore>(store: &S) {
    let uids = ["test_many_1", "test_many_2", "test_many_3"];
    for uid in uids {
        store
            .persist(&sample_order(uid))
            .await
            .expect("persist should succeed");
    }

    let orders: Vec<Order> = store
        .load_all()
        .try_collect()
        .await
        .expect("load_all should succeed");

    for uid in uids {
        let order = orders
            .iter()
            .find(|o| o.order_uid == uid)
            .expect("every persisted order is loaded");
        assert_eq!(order, &sample_order(uid));
    }
}

/// Run all OrderStore interface tests.
#[macro_export]
macro_rules! run_order_store_tests {
    ($store:expr) => {
        use $crate::storage::order_store_tests::*;

        // persist tests
        test_persist_roundtrip($store).await;
        println!("  test_persist_roundtrip: PASSED");

        test_persist_is_idempotent($store).await;
        println!("  test_persist_is_idempotent: PASSED");

        test_persist_replaces_items($store).await;
        println!("  test_persist_replaces_items: PASSED");

        test_persist_preserves_item_order($store).await;
        println!("  test_persist_preserves_item_order: PASSED");

        test_persist_empty_items($store).await;
        println!("  test_persist_empty_items: PASSED");

        test_persist_updates_scalar_fields($store).await;
        println!("  test_persist_updates_scalar_fields: PASSED");

        // load_all tests
        test_load_all_returns_every_order($store).await;
        println!("  test_load_all_returns_every_order: PASSED");
    };
}
