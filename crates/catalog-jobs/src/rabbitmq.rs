//! RabbitMQ work queue.
//!
//! Publishes to the default exchange with the queue name as routing key.
//! The queue is declared durable and messages are persistent, so work
//! survives a broker restart. Consumers use manual acknowledgement with a
//! prefetch limit. A broken connection is re-established on the next
//! publish or subscribe.
//!
//! The connection lock only guards swapping the link. Publishes share the
//! confirm channel concurrently and await their confirms outside the lock.

use crate::envelope::WorkMessage;
use crate::error::{JobError, JobResult};
use crate::metrics::QueueMetrics;
use crate::queue::{Acknowledger, Delivery, DeliveryStream, WorkQueue};
use async_trait::async_trait;
use catalog_config::QueueConfig;
use futures::StreamExt;
use lapin::{
    acker::Acker,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
        BasicQosOptions, ConfirmSelectOptions, QueueDeclareOptions,
    },
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// AMQP persistent delivery mode.
const PERSISTENT: u8 = 2;

struct Link {
    connection: Connection,
    publisher: Channel,
}

impl Link {
    fn is_open(&self) -> bool {
        self.connection.status().connected() && self.publisher.status().connected()
    }
}

/// Work queue backed by a durable RabbitMQ queue.
pub struct RabbitMqWorkQueue {
    url: String,
    queue_name: String,
    prefetch: u16,
    connect_timeout: Duration,
    link: Mutex<Option<Arc<Link>>>,
}

impl RabbitMqWorkQueue {
    /// Connects to the broker and declares the queue.
    pub async fn connect(config: &QueueConfig) -> JobResult<Self> {
        let queue = Self {
            url: config.url.clone(),
            queue_name: config.queue_name.clone(),
            prefetch: config.prefetch,
            connect_timeout: config.connect_timeout(),
            link: Mutex::new(None),
        };

        queue.current_link().await?;

        info!(queue = %queue.queue_name, "Connected to RabbitMQ");
        Ok(queue)
    }

    async fn open_link(&self) -> JobResult<Link> {
        let connection = timeout(
            self.connect_timeout,
            Connection::connect(&self.url, ConnectionProperties::default()),
        )
        .await
        .map_err(|_| {
            JobError::Connection(format!(
                "Timed out connecting to RabbitMQ after {:?}",
                self.connect_timeout
            ))
        })?
        .map_err(|e| JobError::Connection(format!("Failed to connect to RabbitMQ: {e}")))?;

        let publisher = connection
            .create_channel()
            .await
            .map_err(|e| JobError::Connection(format!("Failed to create channel: {e}")))?;

        publisher
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| JobError::Connection(format!("Failed to enable confirms: {e}")))?;

        self.declare(&publisher).await?;

        Ok(Link {
            connection,
            publisher,
        })
    }

    async fn declare(&self, channel: &Channel) -> JobResult<()> {
        channel
            .queue_declare(
                &self.queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                JobError::Connection(format!("Failed to declare queue {}: {e}", self.queue_name))
            })?;
        Ok(())
    }

    /// Returns the open link, reconnecting if it is missing or broken.
    async fn current_link(&self) -> JobResult<Arc<Link>> {
        let mut guard = self.link.lock().await;
        if let Some(link) = guard.as_ref().filter(|link| link.is_open()) {
            return Ok(Arc::clone(link));
        }

        debug!(queue = %self.queue_name, "Opening RabbitMQ connection");
        let link = Arc::new(self.open_link().await?);
        let stale = guard.replace(Arc::clone(&link));
        drop(guard);

        if let Some(stale) = stale {
            Self::close_link(&stale, "reconnect").await;
        }
        Ok(link)
    }

    /// Drops `failed` so the next call reconnects, unless another caller
    /// already replaced it.
    async fn discard_link(&self, failed: &Arc<Link>) {
        let discarded = {
            let mut guard = self.link.lock().await;
            match guard.as_ref() {
                Some(current) if Arc::ptr_eq(current, failed) => guard.take(),
                _ => None,
            }
        };
        if let Some(link) = discarded {
            Self::close_link(&link, "publish failed").await;
        }
    }

    async fn close_link(link: &Link, reason: &str) {
        if !link.connection.status().connected() {
            return;
        }
        if let Err(e) = link.connection.close(200, reason).await {
            warn!(error = %e, "Error closing RabbitMQ connection");
        }
    }

    /// Closes the broker connection.
    pub async fn close(&self) {
        let link = self.link.lock().await.take();
        if let Some(link) = link {
            Self::close_link(&link, "shutdown").await;
        }
    }
}

struct RabbitMqAcker {
    acker: Acker,
}

#[async_trait]
impl Acknowledger for RabbitMqAcker {
    async fn ack(&self) -> JobResult<()> {
        self.acker
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| JobError::Acknowledge(e.to_string()))
    }

    async fn nack(&self, requeue: bool) -> JobResult<()> {
        self.acker
            .nack(BasicNackOptions {
                requeue,
                ..BasicNackOptions::default()
            })
            .await
            .map_err(|e| JobError::Acknowledge(e.to_string()))
    }
}

#[async_trait]
impl WorkQueue for RabbitMqWorkQueue {
    fn name(&self) -> &str {
        &self.queue_name
    }

    async fn publish(&self, message: &WorkMessage) -> JobResult<()> {
        let payload = message.encode()?;
        let properties = BasicProperties::default()
            .with_delivery_mode(PERSISTENT)
            .with_content_type("application/json".into())
            .with_message_id(message.id.to_string().into())
            .with_kind(message.item.kind().into());

        let link = self.current_link().await?;

        let result = async {
            let confirmation = link
                .publisher
                .basic_publish(
                    "",
                    &self.queue_name,
                    BasicPublishOptions::default(),
                    &payload,
                    properties,
                )
                .await
                .map_err(|e| JobError::Publish(e.to_string()))?
                .await
                .map_err(|e| JobError::Publish(e.to_string()))?;
            if confirmation.is_nack() {
                return Err(JobError::Publish("broker rejected message".to_string()));
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                QueueMetrics::published(&self.queue_name, message.item.kind());
                debug!(queue = %self.queue_name, message = %message, "Published work item");
                Ok(())
            }
            Err(e) => {
                self.discard_link(&link).await;
                Err(e)
            }
        }
    }

    async fn subscribe(&self) -> JobResult<DeliveryStream> {
        let link = self.current_link().await?;

        let channel = link.connection.create_channel().await?;
        self.declare(&channel).await?;
        channel
            .basic_qos(self.prefetch, BasicQosOptions::default())
            .await?;

        let consumer = channel
            .basic_consume(
                &self.queue_name,
                &format!("catalog-{}", Uuid::new_v4()),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(queue = %self.queue_name, prefetch = self.prefetch, "Subscribed to work queue");

        // The consumer channel lives as long as the stream.
        let stream = consumer.map(move |delivery| {
            let _channel = &channel;
            let delivery = delivery?;
            Ok(Delivery::new(
                delivery.data,
                delivery.redelivered,
                Box::new(RabbitMqAcker {
                    acker: delivery.acker,
                }),
            ))
        });

        Ok(stream.boxed())
    }
}
