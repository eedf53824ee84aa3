//! Durable order storage.
//!
//! This module contains:
//! - `OrderStore` trait: transactional persistence and full reload
//! - `StorageError`: failure taxonomy for store operations
//! - Implementations: SQL (PostgreSQL, SQLite), Mock
//!
//! Every `persist` call runs in exactly one transaction spanning the
//! `orders`, `delivery`, `payment` and `items` tables.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::model::Order;

pub mod helpers;
pub mod mock;
pub mod schema;
pub mod sql;

pub use mock::MockOrderStore;
#[cfg(feature = "postgres")]
pub use sql::postgres::PostgresOrderStore;
pub use sql::SqlOrderStore;
#[cfg(feature = "sqlite")]
pub use sql::sqlite::SqliteOrderStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid timestamp in column date_created: {0:?}")]
    InvalidTimestamp(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Interface for order persistence.
///
/// Implementations:
/// - `PostgresOrderStore`: production relational store
/// - `SqliteOrderStore`: standalone/local store
/// - `MockOrderStore`: in-memory store for testing
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Create the tables if they don't exist.
    async fn init(&self) -> Result<()>;

    /// Upsert the full entity graph of one order atomically.
    ///
    /// On any failure nothing is written: prior rows for the order stay as
    /// they were.
    async fn persist(&self, order: &Order) -> Result<()>;

    /// Stream every stored order, each fully assembled with its items.
    ///
    /// The stream is single-pass and holds one connection until it ends.
    /// Items are read per order as the stream is polled. An `Err` item
    /// means the load failed; consumers stop at the first error.
    fn load_all(&self) -> BoxStream<'_, Result<Order>>;
}

/// Run `persist` under a deadline.
///
/// When the deadline expires the in-flight future is dropped, which drops
/// its open transaction and rolls it back. No partial commit is observable.
///
/// If the deadline fires after COMMIT was sent, the order may be committed
/// while `Timeout` is still reported. The caller then skips the cache, and
/// the order is served again once the message is redelivered; re-ingesting
/// the same order is idempotent.
pub async fn persist_within(
    store: &dyn OrderStore,
    order: &Order,
    deadline: Duration,
) -> Result<()> {
    match tokio::time::timeout(deadline, store.persist(order)).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(deadline)),
    }
}

/// Initialize the order store based on configuration.
///
/// Connects (with retry), creates the schema, and returns the store.
pub async fn init_store(
    config: &StorageConfig,
) -> std::result::Result<Arc<dyn OrderStore>, Box<dyn std::error::Error>> {
    match config.storage_type {
        StorageType::Postgres => {
            #[cfg(feature = "postgres")]
            {
                use sqlx::postgres::PgPoolOptions;

                let pg = &config.postgres;
                info!(host = %pg.host, port = pg.port, database = %pg.database, "Storage: postgres");

                let options = pg.connect_options();
                let max_connections = pg.max_connections;
                let pool =
                    crate::utils::bootstrap::connect_with_retry("postgres", &pg.host, || {
                        PgPoolOptions::new()
                            .max_connections(max_connections)
                            .connect_with(options.clone())
                    })
                    .await?;

                let store = Arc::new(PostgresOrderStore::new(pool));
                store.init().await?;
                Ok(store)
            }

            #[cfg(not(feature = "postgres"))]
            {
                tracing::error!("PostgreSQL storage requested but 'postgres' feature is not enabled");
                Err("PostgreSQL support requires the 'postgres' feature".into())
            }
        }
        StorageType::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                let path = &config.sqlite.path;
                info!(path = %path, "Storage: sqlite");

                if let Some(parent) = std::path::Path::new(path).parent() {
                    std::fs::create_dir_all(parent)?;
                }

                let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path)).await?;

                let store = Arc::new(SqliteOrderStore::new(pool));
                store.init().await?;
                Ok(store)
            }

            #[cfg(not(feature = "sqlite"))]
            {
                tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
                Err("SQLite support requires the 'sqlite' feature".into())
            }
        }
    }
}
