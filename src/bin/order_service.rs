//! order-service: order ingestion and query service
//!
//! ## Startup
//! 1. Connect to the store (with retry) and create the schema
//! 2. Restore the read cache from the store; failure aborts startup
//! 3. Subscribe the ingest handler to the bus and start consuming
//! 4. Serve the HTTP query API until Ctrl+C
//!
//! ## Configuration
//! - `config.yaml`, `--config <path>` or ORDER_SERVICE_CONFIG
//! - ORDER_SERVICE__SECTION__KEY environment overrides
//! - DB_HOST/DB_PORT/DB_USER/DB_PASSWORD/DB_NAME, NATS_URL/NATS_CLIENT_ID/
//!   NATS_CHANNEL/NATS_DURABLE_ID, HTTP_PORT legacy variables
//! - ORDER_SERVICE_LOG: log filter (default "info")

use std::sync::Arc;

use tracing::{error, info};

use order_service::api;
use order_service::bus::init_bus;
use order_service::cache::{InMemoryOrderCache, OrderCache};
use order_service::config::Config;
use order_service::handlers::IngestHandler;
use order_service::services::{restore_cache, OrderPipeline, OrderService};
use order_service::storage::init_store;
use order_service::utils::bootstrap::{init_tracing, parse_config_path, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting order-service");

    let store = init_store(&config.storage).await.map_err(|e| {
        error!(error = %e, "Failed to initialize storage");
        e
    })?;
    info!("Storage initialized");

    let cache: Arc<dyn OrderCache> = Arc::new(InMemoryOrderCache::new());
    let restored = restore_cache(store.as_ref(), cache.as_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to restore cache");
            e
        })?;
    info!(restored, "Cache ready");

    let pipeline: Arc<dyn OrderService> = Arc::new(
        OrderPipeline::new(store, cache).with_persist_timeout(config.pipeline.persist_timeout()),
    );

    let bus = init_bus(&config.messaging).await.map_err(|e| {
        error!(error = %e, "Failed to initialize message bus");
        e
    })?;
    bus.subscribe(Arc::new(IngestHandler::new(pipeline.clone())))
        .await?;
    bus.start_consuming().await?;
    info!("Consuming orders");

    info!("Press Ctrl+C to exit");
    api::serve(
        pipeline,
        &config.server.host,
        config.server.http_port,
        shutdown_signal(),
    )
    .await
    .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    info!("Shutting down...");
    Ok(())
}
