//! order-publisher: publish a sample order to the bus
//!
//! Usage: `order-publisher [--config <path>] [ORDER_UID]`
//!
//! Builds the reference sample order, optionally with the given
//! `order_uid`, and publishes it as JSON on the configured subject.

use tracing::{error, info};

use order_service::bus::init_bus;
use order_service::config::Config;
use order_service::model::fixtures::sample_order;
use order_service::utils::bootstrap::{init_tracing, parse_config_path};

const DEFAULT_ORDER_UID: &str = "b563feb7b2b84b6test";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let order_uid = order_uid_from_args(std::env::args().skip(1))
        .unwrap_or_else(|| DEFAULT_ORDER_UID.to_string());
    let order = sample_order(&order_uid);
    let payload = order.to_json()?;

    let bus = init_bus(&config.messaging).await?;
    bus.publish(payload.into()).await?;

    info!(
        order_uid = %order.order_uid,
        subject = %config.messaging.nats.subject,
        "Published order"
    );
    Ok(())
}

/// First positional argument, skipping `--config <path>`.
fn order_uid_from_args(args: impl IntoIterator<Item = String>) -> Option<String> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                args.next();
            }
            a if a.starts_with("--config=") => {}
            _ => return Some(arg),
        }
    }
    None
}
