//! Work queue abstraction.
//!
//! A queue is durable and at-least-once: a delivery stays owned by the
//! consumer until it is acknowledged, and is redelivered if the consumer
//! rejects it with requeue or disappears.

use crate::envelope::WorkMessage;
use crate::error::JobResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;

/// Settles a single delivery with the broker.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Confirms the delivery was processed.
    async fn ack(&self) -> JobResult<()>;

    /// Gives the delivery back; `requeue` decides whether it is redelivered.
    async fn nack(&self, requeue: bool) -> JobResult<()>;
}

/// One message received from the queue.
pub struct Delivery {
    payload: Vec<u8>,
    redelivered: bool,
    acker: Box<dyn Acknowledger>,
}

impl Delivery {
    /// Creates a delivery.
    pub fn new(payload: Vec<u8>, redelivered: bool, acker: Box<dyn Acknowledger>) -> Self {
        Self {
            payload,
            redelivered,
            acker,
        }
    }

    /// Raw message body.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// True if the broker delivered this message before.
    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    /// Acknowledges the delivery.
    pub async fn ack(self) -> JobResult<()> {
        self.acker.ack().await
    }

    /// Rejects the delivery.
    pub async fn nack(self, requeue: bool) -> JobResult<()> {
        self.acker.nack(requeue).await
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("bytes", &self.payload.len())
            .field("redelivered", &self.redelivered)
            .finish()
    }
}

/// Stream of deliveries from one subscription. It ends when the underlying
/// channel closes; an `Err` item means the subscription is broken.
pub type DeliveryStream = BoxStream<'static, JobResult<Delivery>>;

/// Durable work queue.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Queue name, for logs and metrics.
    fn name(&self) -> &str;

    /// Publishes a work message.
    async fn publish(&self, message: &WorkMessage) -> JobResult<()>;

    /// Opens a consumer subscription with manual acknowledgement.
    async fn subscribe(&self) -> JobResult<DeliveryStream>;
}
