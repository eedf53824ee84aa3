use super::fixtures::sample_order;
use super::*;

#[test]
fn test_roundtrip_preserves_nested_entities() {
    let order = sample_order("RWBLABS");

    let payload = order.to_json().unwrap();
    let decoded = Order::decode(&payload).unwrap();

    assert_eq!(decoded, order);
    assert_eq!(decoded.items[0].chrt_id, 9034930);
    assert_eq!(decoded.payment.transaction, "RWBLABS-txn");
}

#[test]
fn test_empty_items_stay_an_array() {
    let mut order = sample_order("no-items");
    order.items.clear();

    let payload = order.to_json().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(json["items"], serde_json::json!([]));

    let decoded = Order::decode(&payload).unwrap();
    assert!(decoded.items.is_empty());
}

#[test]
fn test_null_items_decode_as_empty() {
    let decoded = Order::decode(br#"{"order_uid":"u1","items":null}"#).unwrap();
    assert!(decoded.items.is_empty());
}

#[test]
fn test_missing_fields_take_zero_values() {
    let decoded = Order::from_json(br#"{"track_number":"TRACK123"}"#).unwrap();

    assert_eq!(decoded.track_number, "TRACK123");
    assert!(decoded.order_uid.is_empty());
    assert_eq!(decoded.payment, Payment::default());
    assert_eq!(decoded.delivery, Delivery::default());
}

#[test]
fn test_invalid_json_is_malformed() {
    let err = Order::decode(b"{invalid json}").unwrap_err();
    assert!(matches!(err, ModelError::Malformed(_)));
}

#[test]
fn test_wrong_field_type_is_malformed() {
    let err = Order::decode(br#"{"order_uid":"u1","sm_id":"not-a-number"}"#).unwrap_err();
    assert!(matches!(err, ModelError::Malformed(_)));
}

#[test]
fn test_missing_order_uid_fails_validation() {
    let err = Order::decode(br#"{"track_number":"TRACK123"}"#).unwrap_err();

    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::MissingOrderUid)
    ));
    assert!(err.to_string().contains("order_uid is required"));
}

#[test]
fn test_empty_order_uid_fails_validation() {
    let err = Order::decode(br#"{"order_uid":""}"#).unwrap_err();
    assert!(err.to_string().contains("order_uid is required"));
}

#[test]
fn test_date_created_uses_rfc3339() {
    let decoded =
        Order::decode(br#"{"order_uid":"u1","date_created":"2021-11-26T06:22:19Z"}"#).unwrap();
    assert_eq!(decoded.date_created.to_rfc3339(), "2021-11-26T06:22:19+00:00");
}
