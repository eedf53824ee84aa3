//! NATS JetStream message bus implementation.
//!
//! Orders arrive on one subject inside one stream. The service reads them
//! through a durable pull consumer with explicit acks, so the delivery
//! position survives restarts and unacknowledged messages are redelivered
//! by the server after `ack_wait`.
//!
//! | Handler outcome | Acknowledgement |
//! |-----------------|-----------------|
//! | success         | `ack`           |
//! | retryable       | `nak` (redeliver, up to `max_deliver`) |
//! | rejected        | `term` (never redeliver) |

use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{
    self,
    consumer::{pull::Config as ConsumerConfig, AckPolicy, DeliverPolicy, PullConsumer},
    stream::{Config as StreamConfig, RetentionPolicy, StorageType},
    AckKind, Context,
};
use async_trait::async_trait;
use backon::{BackoffBuilder, ExponentialBuilder};
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::{
    dispatch_to_handlers, BusError, DispatchResult, MessageBus, MessageHandler, NatsConfig, Result,
};

type Handlers = Arc<RwLock<Vec<Arc<dyn MessageHandler>>>>;

/// Message bus backed by a NATS JetStream durable consumer.
pub struct NatsMessageBus {
    jetstream: Context,
    config: NatsConfig,
    handlers: Handlers,
    consuming: Arc<RwLock<bool>>,
}

impl NatsMessageBus {
    /// Connect to the server and make sure the stream exists.
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let client = async_nats::ConnectOptions::new()
            .name(&config.client_id)
            .connect(&config.url)
            .await
            .map_err(|e| BusError::Connection(format!("{}: {}", config.url, e)))?;

        Self::new(client, config).await
    }

    /// Wrap an already connected client and make sure the stream exists.
    pub async fn new(client: async_nats::Client, config: NatsConfig) -> Result<Self> {
        let jetstream = jetstream::new(client);
        Self::ensure_stream(&jetstream, &config).await?;

        info!(
            url = %config.url,
            stream = %config.stream,
            subject = %config.subject,
            "Connected to NATS JetStream"
        );

        Ok(Self {
            jetstream,
            config,
            handlers: Arc::new(RwLock::new(Vec::new())),
            consuming: Arc::new(RwLock::new(false)),
        })
    }

    /// Create the stream if it does not exist yet.
    async fn ensure_stream(jetstream: &Context, config: &NatsConfig) -> Result<jetstream::stream::Stream> {
        jetstream
            .get_or_create_stream(StreamConfig {
                name: config.stream.clone(),
                subjects: vec![config.subject.clone()],
                retention: RetentionPolicy::Limits,
                storage: StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(|e| BusError::Subscribe(format!("Failed to create stream: {}", e)))
    }

    /// Look up or create the durable consumer.
    async fn setup_consumer(jetstream: &Context, config: &NatsConfig) -> Result<PullConsumer> {
        let stream = Self::ensure_stream(jetstream, config).await?;

        stream
            .get_or_create_consumer(
                &config.durable_name,
                ConsumerConfig {
                    durable_name: Some(config.durable_name.clone()),
                    filter_subject: config.subject.clone(),
                    deliver_policy: DeliverPolicy::All,
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_secs),
                    max_deliver: config.max_deliver,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BusError::Subscribe(format!("Failed to create consumer: {}", e)))
    }

    /// Consumer loop with automatic reconnection and exponential backoff with jitter.
    async fn consume_with_reconnect(jetstream: Context, config: NatsConfig, handlers: Handlers) {
        let backoff_builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(30))
            .with_jitter();

        let mut backoff_iter = backoff_builder.build();
        let max_in_flight = config.max_in_flight.max(1);

        loop {
            let messages = match Self::setup_consumer(&jetstream, &config).await {
                Ok(consumer) => consumer.messages().await.map_err(|e| {
                    BusError::Subscribe(format!("Failed to get message stream: {}", e))
                }),
                Err(e) => Err(e),
            };

            match messages {
                Ok(messages) => {
                    info!(
                        durable = %config.durable_name,
                        subject = %config.subject,
                        "Consumer connected, processing messages"
                    );
                    // Reset backoff on successful connection
                    backoff_iter = backoff_builder.build();

                    messages
                        .take_while(|delivery| {
                            if let Err(e) = delivery {
                                error!(error = %e, "Consumer delivery error, will reconnect");
                            }
                            futures::future::ready(delivery.is_ok())
                        })
                        .filter_map(|delivery| futures::future::ready(delivery.ok()))
                        .for_each_concurrent(max_in_flight, |message| {
                            let handlers = handlers.clone();
                            async move { Self::process_message(message, &handlers).await }
                        })
                        .await;

                    info!(durable = %config.durable_name, "Consumer stream ended, reconnecting...");
                }
                Err(e) => {
                    let delay = backoff_iter.next().unwrap_or(Duration::from_secs(30));
                    error!(
                        error = %e,
                        backoff_ms = %delay.as_millis(),
                        durable = %config.durable_name,
                        "Failed to set up consumer, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }

            // Brief pause before reconnecting after stream end (not error)
            let delay = backoff_iter.next().unwrap_or(Duration::from_secs(30));
            tokio::time::sleep(delay).await;
        }
    }

    /// Dispatch one message and settle it with the server.
    async fn process_message(message: jetstream::Message, handlers: &Handlers) {
        let delivered = message.info().map(|info| info.delivered).unwrap_or_default();
        let result = dispatch_to_handlers(handlers, &message.payload).await;

        let ack = match result {
            DispatchResult::Success => message.ack().await,
            DispatchResult::Retry => {
                warn!(delivered, "Message failed, requesting redelivery");
                message.ack_with(AckKind::Nak(None)).await
            }
            DispatchResult::Rejected => {
                warn!(delivered, "Message rejected, terminating delivery");
                message.ack_with(AckKind::Term).await
            }
        };

        match ack {
            Ok(()) => debug!(delivered, ?result, "Message settled"),
            Err(e) => error!(error = %e, ?result, "Failed to acknowledge message"),
        }
    }
}

#[async_trait]
impl MessageBus for NatsMessageBus {
    #[tracing::instrument(name = "bus.publish", skip_all, fields(subject = %self.config.subject))]
    async fn publish(&self, payload: Bytes) -> Result<()> {
        self.jetstream
            .publish(self.config.subject.clone(), payload)
            .await
            .map_err(|e| BusError::Publish(format!("Failed to publish: {}", e)))?
            .await
            .map_err(|e| BusError::Publish(format!("Publish ack failed: {}", e)))?;

        debug!(subject = %self.config.subject, "Published payload");
        Ok(())
    }

    async fn subscribe(&self, handler: Arc<dyn MessageHandler>) -> Result<()> {
        let count = {
            let mut handlers = self.handlers.write().await;
            handlers.push(handler);
            handlers.len()
        };

        info!(handler_count = count, "Handler subscribed to NATS bus");

        Ok(())
    }

    async fn start_consuming(&self) -> Result<()> {
        {
            let mut consuming = self.consuming.write().await;
            if *consuming {
                return Ok(());
            }
            *consuming = true;
        }

        let jetstream = self.jetstream.clone();
        let config = self.config.clone();
        let handlers = self.handlers.clone();

        tokio::spawn(async move {
            Self::consume_with_reconnect(jetstream, config, handlers).await;
        });

        Ok(())
    }
}
