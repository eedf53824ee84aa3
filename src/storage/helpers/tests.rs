use super::*;
use chrono::TimeZone;

#[test]
fn test_format_timestamp_is_utc_rfc3339() {
    let ts = Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap();
    assert_eq!(format_timestamp(&ts), "2021-11-26T06:22:19Z");
}

#[test]
fn test_timestamp_roundtrip_keeps_subsecond_precision() {
    let ts = Utc.timestamp_opt(1_637_907_727, 123_456_789).unwrap();
    let parsed = parse_timestamp(&format_timestamp(&ts)).unwrap();
    assert_eq!(parsed, ts);
}

#[test]
fn test_parse_timestamp_accepts_offsets() {
    let parsed = parse_timestamp("2021-11-26T09:22:19+03:00").unwrap();
    assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap());
}

#[test]
fn test_parse_timestamp_rejects_garbage() {
    let result = parse_timestamp("yesterday");
    assert!(matches!(result, Err(StorageError::InvalidTimestamp(raw)) if raw == "yesterday"));
}
