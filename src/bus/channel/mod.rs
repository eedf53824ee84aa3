//! In-memory channel-based message bus for standalone mode.
//!
//! Uses a tokio mpsc channel as a single-consumer queue within one process.
//! Retryable failures are re-queued until `max_deliver` attempts are used up,
//! mirroring the redelivery contract of the NATS consumer.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{dispatch_to_handlers, BusError, ChannelConfig, DispatchResult, MessageBus, MessageHandler, Result};

/// A queued payload and the delivery attempt it is on (1-based).
struct Envelope {
    payload: Bytes,
    attempt: u32,
}

/// In-memory message bus using a tokio mpsc channel.
pub struct ChannelMessageBus {
    /// Sender for publishing payloads.
    sender: mpsc::UnboundedSender<Envelope>,
    /// Receiver, taken by the consumer task on `start_consuming`.
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>,
    /// Registered message handlers.
    handlers: Arc<RwLock<Vec<Arc<dyn MessageHandler>>>>,
    config: ChannelConfig,
}

impl ChannelMessageBus {
    /// Create a new channel message bus.
    pub fn new(config: ChannelConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        info!(max_deliver = config.max_deliver, "Channel message bus initialized");

        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            handlers: Arc::new(RwLock::new(Vec::new())),
            config,
        }
    }

    /// Start consuming messages (call after subscribe).
    async fn start_consuming_impl(&self) -> Result<()> {
        let Some(mut receiver) = self.receiver.lock().await.take() else {
            return Ok(());
        };

        let handlers = self.handlers.clone();
        // Weak, so the consumer task ends once the bus is dropped.
        let requeue = self.sender.downgrade();
        let max_deliver = self.config.max_deliver.max(1);

        tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let result = dispatch_to_handlers(&handlers, &envelope.payload).await;

                match result {
                    DispatchResult::Success => {
                        debug!(attempt = envelope.attempt, "Message processed");
                    }
                    DispatchResult::Rejected => {
                        warn!(attempt = envelope.attempt, "Message rejected, dropping");
                    }
                    DispatchResult::Retry if envelope.attempt < max_deliver => {
                        let Some(sender) = requeue.upgrade() else {
                            break;
                        };
                        debug!(attempt = envelope.attempt, "Message failed, redelivering");
                        let next = Envelope {
                            payload: envelope.payload,
                            attempt: envelope.attempt + 1,
                        };
                        if sender.send(next).is_err() {
                            break;
                        }
                    }
                    DispatchResult::Retry => {
                        warn!(
                            attempt = envelope.attempt,
                            max_deliver, "Message failed, delivery attempts exhausted"
                        );
                    }
                }
            }

            info!("Channel closed, stopping consumer");
        });

        info!("Channel consumer started");

        Ok(())
    }
}

impl Default for ChannelMessageBus {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}

#[async_trait]
impl MessageBus for ChannelMessageBus {
    #[tracing::instrument(name = "bus.publish", skip_all, fields(bytes = payload.len()))]
    async fn publish(&self, payload: Bytes) -> Result<()> {
        self.sender
            .send(Envelope {
                payload,
                attempt: 1,
            })
            .map_err(|_| BusError::Publish("Channel closed".to_string()))?;

        debug!("Published payload to channel");
        Ok(())
    }

    async fn subscribe(&self, handler: Arc<dyn MessageHandler>) -> Result<()> {
        let count = {
            let mut handlers = self.handlers.write().await;
            handlers.push(handler);
            handlers.len()
        };

        info!(handler_count = count, "Handler subscribed to channel bus");

        Ok(())
    }

    async fn start_consuming(&self) -> Result<()> {
        self.start_consuming_impl().await
    }
}
