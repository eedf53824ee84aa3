//! Unified SQL OrderStore implementation.
//!
//! Statement building is generic over `SqlDatabase`; a macro generates the
//! `OrderStore` impl for each SQL backend, since row types and transaction
//! types differ per driver.

use std::marker::PhantomData;

use futures::stream::BoxStream;
use futures::{StreamExt, TryFutureExt};
use sea_query::{Alias, Expr, OnConflict, Order as SortOrder, Query};
use sqlx::Row;
use tracing::debug;

use super::SqlDatabase;
use crate::model::{Delivery, Item, Order, Payment};
use crate::storage::helpers::{format_timestamp, parse_timestamp};
use crate::storage::schema::{self, Items, Orders};
use crate::storage::{Result, StorageError};

/// SQL-based implementation of OrderStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlOrderStore<DB: SqlDatabase> {
    pool: DB::Pool,
    load_sql: String,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlOrderStore<DB> {
    /// Create a new SQL order store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            load_sql: load_orders_sql::<DB>(),
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Build the statements `persist` runs inside its transaction, in order.
///
/// 1. upsert `orders` by `order_uid`
/// 2. upsert `delivery` by `order_uid`
/// 3. delete `payment` rows of this order under a different transaction
/// 4. upsert `payment` by `transaction`
/// 5. delete all `items` of this order
/// 6. insert each item, preserving sequence order
pub fn persist_statements<DB: SqlDatabase>(order: &Order) -> Vec<String> {
    let uid = order.order_uid.as_str();
    let delivery = &order.delivery;
    let payment = &order.payment;

    let mut statements = Vec::with_capacity(5 + order.items.len());

    let upsert_order = Query::insert()
        .into_table(Orders::Table)
        .columns([
            Orders::OrderUid,
            Orders::TrackNumber,
            Orders::Entry,
            Orders::Locale,
            Orders::InternalSignature,
            Orders::CustomerId,
            Orders::DeliveryService,
            Orders::Shardkey,
            Orders::SmId,
            Orders::DateCreated,
            Orders::OofShard,
        ])
        .values_panic([
            uid.into(),
            order.track_number.as_str().into(),
            order.entry.as_str().into(),
            order.locale.as_str().into(),
            order.internal_signature.as_str().into(),
            order.customer_id.as_str().into(),
            order.delivery_service.as_str().into(),
            order.shardkey.as_str().into(),
            order.sm_id.into(),
            format_timestamp(&order.date_created).into(),
            order.oof_shard.as_str().into(),
        ])
        .on_conflict(
            OnConflict::column(Orders::OrderUid)
                .update_columns([
                    Orders::TrackNumber,
                    Orders::Entry,
                    Orders::Locale,
                    Orders::InternalSignature,
                    Orders::CustomerId,
                    Orders::DeliveryService,
                    Orders::Shardkey,
                    Orders::SmId,
                    Orders::DateCreated,
                    Orders::OofShard,
                ])
                .to_owned(),
        )
        .to_owned();
    statements.push(DB::build_insert(upsert_order));

    let upsert_delivery = Query::insert()
        .into_table(schema::Delivery::Table)
        .columns([
            schema::Delivery::OrderUid,
            schema::Delivery::Name,
            schema::Delivery::Phone,
            schema::Delivery::Zip,
            schema::Delivery::City,
            schema::Delivery::Address,
            schema::Delivery::Region,
            schema::Delivery::Email,
        ])
        .values_panic([
            uid.into(),
            delivery.name.as_str().into(),
            delivery.phone.as_str().into(),
            delivery.zip.as_str().into(),
            delivery.city.as_str().into(),
            delivery.address.as_str().into(),
            delivery.region.as_str().into(),
            delivery.email.as_str().into(),
        ])
        .on_conflict(
            OnConflict::column(schema::Delivery::OrderUid)
                .update_columns([
                    schema::Delivery::Name,
                    schema::Delivery::Phone,
                    schema::Delivery::Zip,
                    schema::Delivery::City,
                    schema::Delivery::Address,
                    schema::Delivery::Region,
                    schema::Delivery::Email,
                ])
                .to_owned(),
        )
        .to_owned();
    statements.push(DB::build_insert(upsert_delivery));

    let delete_stale_payments = Query::delete()
        .from_table(schema::Payment::Table)
        .and_where(Expr::col(schema::Payment::OrderUid).eq(uid))
        .and_where(Expr::col(schema::Payment::Transaction).ne(payment.transaction.as_str()))
        .to_owned();
    statements.push(DB::build_delete(delete_stale_payments));

    let upsert_payment = Query::insert()
        .into_table(schema::Payment::Table)
        .columns([
            schema::Payment::Transaction,
            schema::Payment::OrderUid,
            schema::Payment::RequestId,
            schema::Payment::Currency,
            schema::Payment::Provider,
            schema::Payment::Amount,
            schema::Payment::PaymentDt,
            schema::Payment::Bank,
            schema::Payment::DeliveryCost,
            schema::Payment::GoodsTotal,
            schema::Payment::CustomFee,
        ])
        .values_panic([
            payment.transaction.as_str().into(),
            uid.into(),
            payment.request_id.as_str().into(),
            payment.currency.as_str().into(),
            payment.provider.as_str().into(),
            payment.amount.into(),
            payment.payment_dt.into(),
            payment.bank.as_str().into(),
            payment.delivery_cost.into(),
            payment.goods_total.into(),
            payment.custom_fee.into(),
        ])
        .on_conflict(
            OnConflict::column(schema::Payment::Transaction)
                .update_columns([
                    schema::Payment::OrderUid,
                    schema::Payment::RequestId,
                    schema::Payment::Currency,
                    schema::Payment::Provider,
                    schema::Payment::Amount,
                    schema::Payment::PaymentDt,
                    schema::Payment::Bank,
                    schema::Payment::DeliveryCost,
                    schema::Payment::GoodsTotal,
                    schema::Payment::CustomFee,
                ])
                .to_owned(),
        )
        .to_owned();
    statements.push(DB::build_insert(upsert_payment));

    let delete_items = Query::delete()
        .from_table(Items::Table)
        .and_where(Expr::col(Items::OrderUid).eq(uid))
        .to_owned();
    statements.push(DB::build_delete(delete_items));

    for item in &order.items {
        let insert_item = Query::insert()
            .into_table(Items::Table)
            .columns([
                Items::OrderUid,
                Items::ChrtId,
                Items::TrackNumber,
                Items::Price,
                Items::Rid,
                Items::Name,
                Items::Sale,
                Items::Size,
                Items::TotalPrice,
                Items::NmId,
                Items::Brand,
                Items::Status,
            ])
            .values_panic([
                uid.into(),
                item.chrt_id.into(),
                item.track_number.as_str().into(),
                item.price.into(),
                item.rid.as_str().into(),
                item.name.as_str().into(),
                item.sale.into(),
                item.size.as_str().into(),
                item.total_price.into(),
                item.nm_id.into(),
                item.brand.as_str().into(),
                item.status.into(),
            ])
            .to_owned();
        statements.push(DB::build_insert(insert_item));
    }

    statements
}

/// Orders joined with their optional delivery and payment rows.
fn load_orders_sql<DB: SqlDatabase>() -> String {
    let stmt = Query::select()
        .columns([
            (Orders::Table, Orders::OrderUid),
            (Orders::Table, Orders::TrackNumber),
            (Orders::Table, Orders::Entry),
            (Orders::Table, Orders::Locale),
            (Orders::Table, Orders::InternalSignature),
            (Orders::Table, Orders::CustomerId),
            (Orders::Table, Orders::DeliveryService),
            (Orders::Table, Orders::Shardkey),
            (Orders::Table, Orders::SmId),
            (Orders::Table, Orders::DateCreated),
            (Orders::Table, Orders::OofShard),
        ])
        .columns([
            (schema::Delivery::Table, schema::Delivery::Name),
            (schema::Delivery::Table, schema::Delivery::Phone),
            (schema::Delivery::Table, schema::Delivery::Zip),
            (schema::Delivery::Table, schema::Delivery::City),
            (schema::Delivery::Table, schema::Delivery::Address),
            (schema::Delivery::Table, schema::Delivery::Region),
            (schema::Delivery::Table, schema::Delivery::Email),
        ])
        .columns([
            (schema::Payment::Table, schema::Payment::Transaction),
            (schema::Payment::Table, schema::Payment::RequestId),
            (schema::Payment::Table, schema::Payment::Currency),
            (schema::Payment::Table, schema::Payment::Provider),
            (schema::Payment::Table, schema::Payment::Amount),
            (schema::Payment::Table, schema::Payment::PaymentDt),
            (schema::Payment::Table, schema::Payment::Bank),
            (schema::Payment::Table, schema::Payment::DeliveryCost),
            (schema::Payment::Table, schema::Payment::GoodsTotal),
            (schema::Payment::Table, schema::Payment::CustomFee),
        ])
        .from(Orders::Table)
        .left_join(
            schema::Delivery::Table,
            Expr::col((Orders::Table, Orders::OrderUid))
                .equals((schema::Delivery::Table, schema::Delivery::OrderUid)),
        )
        .left_join(
            schema::Payment::Table,
            Expr::col((Orders::Table, Orders::OrderUid))
                .equals((schema::Payment::Table, schema::Payment::OrderUid)),
        )
        .order_by((Orders::Table, Orders::OrderUid), SortOrder::Asc)
        .to_owned();

    DB::build_select(stmt)
}

/// Items of one order in insertion order.
fn load_items_sql<DB: SqlDatabase>(order_uid: &str) -> String {
    let stmt = Query::select()
        .columns([
            Items::ChrtId,
            Items::TrackNumber,
            Items::Price,
            Items::Rid,
            Items::Name,
            Items::Sale,
            Items::Size,
            Items::TotalPrice,
            Items::NmId,
            Items::Brand,
            Items::Status,
        ])
        .from(Items::Table)
        .and_where(Expr::col(Items::OrderUid).eq(order_uid))
        .order_by(Alias::new(DB::ITEM_ORDER_COLUMN), SortOrder::Asc)
        .to_owned();

    DB::build_select(stmt)
}

/// Macro to implement OrderStore for a specific SQL backend.
///
/// Delivery and payment columns come from a LEFT JOIN and may be NULL; a
/// missing row decodes to zero values rather than an error.
macro_rules! impl_order_store {
    ($db_type:ty, $row_type:ty, $conn_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlOrderStore<$db_type> {
            fn order_from_row(row: &$row_type) -> Result<Order> {
                let opt_text = |col: &str| -> Result<String> {
                    Ok(row.try_get::<Option<String>, _>(col)?.unwrap_or_default())
                };
                let opt_int = |col: &str| -> Result<i64> {
                    Ok(row.try_get::<Option<i64>, _>(col)?.unwrap_or_default())
                };

                let date_created: String = row.try_get("date_created")?;

                Ok(Order {
                    order_uid: row.try_get("order_uid")?,
                    track_number: row.try_get("track_number")?,
                    entry: row.try_get("entry")?,
                    delivery: Delivery {
                        name: opt_text("name")?,
                        phone: opt_text("phone")?,
                        zip: opt_text("zip")?,
                        city: opt_text("city")?,
                        address: opt_text("address")?,
                        region: opt_text("region")?,
                        email: opt_text("email")?,
                    },
                    payment: Payment {
                        transaction: opt_text("transaction")?,
                        request_id: opt_text("request_id")?,
                        currency: opt_text("currency")?,
                        provider: opt_text("provider")?,
                        amount: opt_int("amount")?,
                        payment_dt: opt_int("payment_dt")?,
                        bank: opt_text("bank")?,
                        delivery_cost: opt_int("delivery_cost")?,
                        goods_total: opt_int("goods_total")?,
                        custom_fee: opt_int("custom_fee")?,
                    },
                    items: Vec::new(),
                    locale: row.try_get("locale")?,
                    internal_signature: row.try_get("internal_signature")?,
                    customer_id: row.try_get("customer_id")?,
                    delivery_service: row.try_get("delivery_service")?,
                    shardkey: row.try_get("shardkey")?,
                    sm_id: row.try_get("sm_id")?,
                    date_created: parse_timestamp(&date_created)?,
                    oof_shard: row.try_get("oof_shard")?,
                })
            }

            /// Decode one joined row and attach its items, read on `conn`.
            async fn assemble_order(conn: &mut $conn_type, row: &$row_type) -> Result<Order> {
                let mut order = Self::order_from_row(row)?;

                let sql = load_items_sql::<$db_type>(&order.order_uid);
                let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
                order.items = rows
                    .iter()
                    .map(Self::item_from_row)
                    .collect::<Result<Vec<_>>>()?;

                Ok(order)
            }

            fn item_from_row(row: &$row_type) -> Result<Item> {
                Ok(Item {
                    chrt_id: row.try_get("chrt_id")?,
                    track_number: row.try_get("track_number")?,
                    price: row.try_get("price")?,
                    rid: row.try_get("rid")?,
                    name: row.try_get("name")?,
                    sale: row.try_get("sale")?,
                    size: row.try_get("size")?,
                    total_price: row.try_get("total_price")?,
                    nm_id: row.try_get("nm_id")?,
                    brand: row.try_get("brand")?,
                    status: row.try_get("status")?,
                })
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::OrderStore for SqlOrderStore<$db_type> {
            async fn init(&self) -> Result<()> {
                for ddl in <$db_type as SqlDatabase>::SCHEMA {
                    sqlx::query(ddl).execute(&self.pool).await?;
                }
                Ok(())
            }

            async fn persist(&self, order: &Order) -> Result<()> {
                let statements = persist_statements::<$db_type>(order);

                // Dropping `tx` without commit rolls it back.
                let mut tx = self.pool.begin().await?;
                for sql in &statements {
                    sqlx::query(sql).execute(&mut *tx).await?;
                }
                tx.commit().await?;

                debug!(
                    order_uid = %order.order_uid,
                    items = order.items.len(),
                    "Persisted order"
                );

                Ok(())
            }

            fn load_all(&self) -> BoxStream<'_, Result<Order>> {
                let pool = self.pool.clone();
                let load_sql = self.load_sql.clone();

                // One connection for the joined rows and every item query, so
                // a single-connection pool cannot wait on itself.
                async move {
                    let mut conn = pool.acquire().await?;
                    let rows = sqlx::query(&load_sql).fetch_all(&mut *conn).await?;

                    Ok::<_, StorageError>(futures::stream::try_unfold(
                        (conn, rows.into_iter()),
                        |(mut conn, mut rows)| async move {
                            match rows.next() {
                                Some(row) => Self::assemble_order(&mut conn, &row)
                                    .await
                                    .map(|order| Some((order, (conn, rows)))),
                                None => Ok(None),
                            }
                        },
                    ))
                }
                .try_flatten_stream()
                .boxed()
            }
        }
    };
}

impl_order_store!(
    super::postgres::Postgres,
    sqlx::postgres::PgRow,
    sqlx::PgConnection,
    "postgres"
);
impl_order_store!(
    super::sqlite::Sqlite,
    sqlx::sqlite::SqliteRow,
    sqlx::SqliteConnection,
    "sqlite"
);
