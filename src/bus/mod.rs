//! Message bus for inbound order payloads.
//!
//! This module contains:
//! - `MessageBus` trait: publish raw payloads and drive subscribed handlers
//! - `MessageHandler` trait: processes one payload
//! - Bus configuration types
//! - Implementations: NATS JetStream, in-process channel

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::info;

pub mod channel;
pub mod dispatch;
#[cfg(feature = "nats")]
pub mod nats;

pub use channel::ChannelMessageBus;
pub use dispatch::{dispatch_to_handlers, DispatchResult};
#[cfg(feature = "nats")]
pub use nats::NatsMessageBus;

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur during bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    /// The payload can never be processed; redelivery will not help.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// Processing failed for a reason that may clear up on redelivery.
    #[error("Handler failed: {0}")]
    HandlerFailed(String),
}

/// Handler for processing payloads from the bus.
pub trait MessageHandler: Send + Sync {
    /// Process one payload.
    ///
    /// Return `BusError::Rejected` for payloads that must not be redelivered.
    fn handle(&self, payload: Bytes) -> BoxFuture<'static, Result<()>>;
}

/// Interface for inbound message delivery.
///
/// Implementations:
/// - `NatsMessageBus`: NATS JetStream durable consumer
/// - `ChannelMessageBus`: in-process queue for standalone mode and tests
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a payload to the configured subject.
    async fn publish(&self, payload: Bytes) -> Result<()>;

    /// Register a handler. Every delivered payload goes to every handler.
    async fn subscribe(&self, handler: Arc<dyn MessageHandler>) -> Result<()>;

    /// Start delivering messages to subscribed handlers (call after subscribe).
    ///
    /// Returns once the consumer task is spawned. Calling it twice is a no-op.
    async fn start_consuming(&self) -> Result<()>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Messaging type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingType {
    /// NATS JetStream.
    #[default]
    Nats,
    /// In-process channel (standalone mode).
    Channel,
}

/// Messaging configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Messaging type discriminator.
    #[serde(rename = "type")]
    pub messaging_type: MessagingType,
    /// NATS-specific configuration.
    pub nats: NatsConfig,
    /// Channel-specific configuration.
    pub channel: ChannelConfig,
}

/// NATS JetStream configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// Server URL.
    pub url: String,
    /// Connection name reported to the server.
    pub client_id: String,
    /// JetStream stream holding the subject.
    pub stream: String,
    /// Subject orders are published on.
    pub subject: String,
    /// Durable consumer name; the delivery position survives restarts.
    pub durable_name: String,
    /// Seconds the server waits for an ack before redelivering.
    pub ack_wait_secs: u64,
    /// Maximum delivery attempts per message.
    pub max_deliver: i64,
    /// Messages processed concurrently.
    pub max_in_flight: usize,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            client_id: "order-service".to_string(),
            stream: "ORDERS".to_string(),
            subject: "orders".to_string(),
            durable_name: "order-service-durable".to_string(),
            ack_wait_secs: 30,
            max_deliver: 5,
            max_in_flight: 16,
        }
    }
}

/// In-process channel configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Maximum delivery attempts per message.
    pub max_deliver: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { max_deliver: 5 }
    }
}

/// Initialize the message bus based on configuration.
pub async fn init_bus(
    config: &MessagingConfig,
) -> std::result::Result<Arc<dyn MessageBus>, Box<dyn std::error::Error>> {
    match config.messaging_type {
        MessagingType::Nats => {
            #[cfg(feature = "nats")]
            {
                let bus = NatsMessageBus::connect(config.nats.clone()).await?;
                info!(messaging_type = "nats", "Message bus initialized");
                Ok(Arc::new(bus))
            }

            #[cfg(not(feature = "nats"))]
            {
                Err("NATS support requires the 'nats' feature. Rebuild with --features nats".into())
            }
        }
        MessagingType::Channel => {
            let bus = ChannelMessageBus::new(config.channel.clone());
            info!(messaging_type = "channel", "Message bus initialized");
            Ok(Arc::new(bus))
        }
    }
}
