//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building,
//! plus the DDL each backend runs from `OrderStore::init`.

use sea_query::Iden;

/// Orders table schema.
#[derive(Iden, Clone, Copy)]
pub enum Orders {
    Table,
    #[iden = "order_uid"]
    OrderUid,
    #[iden = "track_number"]
    TrackNumber,
    #[iden = "entry"]
    Entry,
    #[iden = "locale"]
    Locale,
    #[iden = "internal_signature"]
    InternalSignature,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "delivery_service"]
    DeliveryService,
    #[iden = "shardkey"]
    Shardkey,
    #[iden = "sm_id"]
    SmId,
    #[iden = "date_created"]
    DateCreated,
    #[iden = "oof_shard"]
    OofShard,
}

/// Delivery table schema. One row per order, keyed by `order_uid`.
#[derive(Iden, Clone, Copy)]
pub enum Delivery {
    Table,
    #[iden = "order_uid"]
    OrderUid,
    #[iden = "name"]
    Name,
    #[iden = "phone"]
    Phone,
    #[iden = "zip"]
    Zip,
    #[iden = "city"]
    City,
    #[iden = "address"]
    Address,
    #[iden = "region"]
    Region,
    #[iden = "email"]
    Email,
}

/// Payment table schema. Keyed by `transaction`, tagged with `order_uid`.
#[derive(Iden, Clone, Copy)]
pub enum Payment {
    Table,
    #[iden = "transaction"]
    Transaction,
    #[iden = "order_uid"]
    OrderUid,
    #[iden = "request_id"]
    RequestId,
    #[iden = "currency"]
    Currency,
    #[iden = "provider"]
    Provider,
    #[iden = "amount"]
    Amount,
    #[iden = "payment_dt"]
    PaymentDt,
    #[iden = "bank"]
    Bank,
    #[iden = "delivery_cost"]
    DeliveryCost,
    #[iden = "goods_total"]
    GoodsTotal,
    #[iden = "custom_fee"]
    CustomFee,
}

/// Items table schema. No declared key; rows are replaced per order.
#[derive(Iden, Clone, Copy)]
pub enum Items {
    Table,
    #[iden = "order_uid"]
    OrderUid,
    #[iden = "chrt_id"]
    ChrtId,
    #[iden = "track_number"]
    TrackNumber,
    #[iden = "price"]
    Price,
    #[iden = "rid"]
    Rid,
    #[iden = "name"]
    Name,
    #[iden = "sale"]
    Sale,
    #[iden = "size"]
    Size,
    #[iden = "total_price"]
    TotalPrice,
    #[iden = "nm_id"]
    NmId,
    #[iden = "brand"]
    Brand,
    #[iden = "status"]
    Status,
}

/// SQL for creating the order tables on PostgreSQL.
///
/// `items.item_seq` is not a key; it only records insertion order.
pub const POSTGRES_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS orders (
    order_uid TEXT PRIMARY KEY,
    track_number TEXT NOT NULL DEFAULT '',
    entry TEXT NOT NULL DEFAULT '',
    locale TEXT NOT NULL DEFAULT '',
    internal_signature TEXT NOT NULL DEFAULT '',
    customer_id TEXT NOT NULL DEFAULT '',
    delivery_service TEXT NOT NULL DEFAULT '',
    shardkey TEXT NOT NULL DEFAULT '',
    sm_id BIGINT NOT NULL DEFAULT 0,
    date_created TEXT NOT NULL,
    oof_shard TEXT NOT NULL DEFAULT ''
)"#,
    r#"
CREATE TABLE IF NOT EXISTS delivery (
    order_uid TEXT PRIMARY KEY REFERENCES orders(order_uid),
    name TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    zip TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    region TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT ''
)"#,
    r#"
CREATE TABLE IF NOT EXISTS payment (
    "transaction" TEXT PRIMARY KEY,
    order_uid TEXT NOT NULL REFERENCES orders(order_uid),
    request_id TEXT NOT NULL DEFAULT '',
    currency TEXT NOT NULL DEFAULT '',
    provider TEXT NOT NULL DEFAULT '',
    amount BIGINT NOT NULL DEFAULT 0,
    payment_dt BIGINT NOT NULL DEFAULT 0,
    bank TEXT NOT NULL DEFAULT '',
    delivery_cost BIGINT NOT NULL DEFAULT 0,
    goods_total BIGINT NOT NULL DEFAULT 0,
    custom_fee BIGINT NOT NULL DEFAULT 0
)"#,
    r#"
CREATE TABLE IF NOT EXISTS items (
    item_seq BIGSERIAL,
    order_uid TEXT NOT NULL REFERENCES orders(order_uid),
    chrt_id BIGINT NOT NULL DEFAULT 0,
    track_number TEXT NOT NULL DEFAULT '',
    price BIGINT NOT NULL DEFAULT 0,
    rid TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT '',
    sale BIGINT NOT NULL DEFAULT 0,
    size TEXT NOT NULL DEFAULT '',
    total_price BIGINT NOT NULL DEFAULT 0,
    nm_id BIGINT NOT NULL DEFAULT 0,
    brand TEXT NOT NULL DEFAULT '',
    status BIGINT NOT NULL DEFAULT 0
)"#,
    "CREATE INDEX IF NOT EXISTS idx_payment_order_uid ON payment(order_uid)",
    "CREATE INDEX IF NOT EXISTS idx_items_order_uid ON items(order_uid)",
];

/// SQL for creating the order tables on SQLite.
///
/// Item insertion order comes from the implicit `rowid`.
pub const SQLITE_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS orders (
    order_uid TEXT PRIMARY KEY,
    track_number TEXT NOT NULL DEFAULT '',
    entry TEXT NOT NULL DEFAULT '',
    locale TEXT NOT NULL DEFAULT '',
    internal_signature TEXT NOT NULL DEFAULT '',
    customer_id TEXT NOT NULL DEFAULT '',
    delivery_service TEXT NOT NULL DEFAULT '',
    shardkey TEXT NOT NULL DEFAULT '',
    sm_id INTEGER NOT NULL DEFAULT 0,
    date_created TEXT NOT NULL,
    oof_shard TEXT NOT NULL DEFAULT ''
)"#,
    r#"
CREATE TABLE IF NOT EXISTS delivery (
    order_uid TEXT PRIMARY KEY REFERENCES orders(order_uid),
    name TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    zip TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    region TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT ''
)"#,
    r#"
CREATE TABLE IF NOT EXISTS payment (
    "transaction" TEXT PRIMARY KEY,
    order_uid TEXT NOT NULL REFERENCES orders(order_uid),
    request_id TEXT NOT NULL DEFAULT '',
    currency TEXT NOT NULL DEFAULT '',
    provider TEXT NOT NULL DEFAULT '',
    amount INTEGER NOT NULL DEFAULT 0,
    payment_dt INTEGER NOT NULL DEFAULT 0,
    bank TEXT NOT NULL DEFAULT '',
    delivery_cost INTEGER NOT NULL DEFAULT 0,
    goods_total INTEGER NOT NULL DEFAULT 0,
    custom_fee INTEGER NOT NULL DEFAULT 0
)"#,
    r#"
CREATE TABLE IF NOT EXISTS items (
    order_uid TEXT NOT NULL REFERENCES orders(order_uid),
    chrt_id INTEGER NOT NULL DEFAULT 0,
    track_number TEXT NOT NULL DEFAULT '',
    price INTEGER NOT NULL DEFAULT 0,
    rid TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT '',
    sale INTEGER NOT NULL DEFAULT 0,
    size TEXT NOT NULL DEFAULT '',
    total_price INTEGER NOT NULL DEFAULT 0,
    nm_id INTEGER NOT NULL DEFAULT 0,
    brand TEXT NOT NULL DEFAULT '',
    status INTEGER NOT NULL DEFAULT 0
)"#,
    "CREATE INDEX IF NOT EXISTS idx_payment_order_uid ON payment(order_uid)",
    "CREATE INDEX IF NOT EXISTS idx_items_order_uid ON items(order_uid)",
];
