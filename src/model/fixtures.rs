//! Sample order used by the demo publisher and by tests.

use chrono::{TimeZone, Utc};

use super::{Delivery, Item, Order, Payment};

/// Build the reference order with the given `order_uid`.
///
/// Mirrors the canonical sample payload (track `TESTTRACK`, one mascara item
/// with `chrt_id` 9034930).
pub fn sample_order(order_uid: &str) -> Order {
    Order {
        order_uid: order_uid.to_string(),
        track_number: "TESTTRACK".to_string(),
        entry: "WB".to_string(),
        delivery: Delivery {
            name: "Wild Berry".to_string(),
            phone: "+78005553535".to_string(),
            zip: "1234567".to_string(),
            city: "Novosibirsk".to_string(),
            address: "Kamenskaya 52/1".to_string(),
            region: "Novosib".to_string(),
            email: "wb-nsuem@gmail.com".to_string(),
        },
        payment: Payment {
            transaction: format!("{}-txn", order_uid),
            request_id: String::new(),
            currency: "RUB".to_string(),
            provider: "wbpay".to_string(),
            amount: 1337,
            payment_dt: 1637907727,
            bank: "VTB".to_string(),
            delivery_cost: 1000,
            goods_total: 337,
            custom_fee: 0,
        },
        items: vec![Item {
            chrt_id: 9034930,
            track_number: "WBILMTESTTRACK".to_string(),
            price: 453,
            rid: "ab4219087a764ae0btest".to_string(),
            name: "Mascaras".to_string(),
            sale: 30,
            size: "0".to_string(),
            total_price: 317,
            nm_id: 2389212,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
        }],
        locale: "en".to_string(),
        internal_signature: String::new(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shardkey: "9".to_string(),
        sm_id: 99,
        date_created: Utc
            .with_ymd_and_hms(2021, 11, 26, 6, 22, 19)
            .single()
            .unwrap_or_default(),
        oof_shard: "1".to_string(),
    }
}
