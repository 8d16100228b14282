//! In-process work queue.
//!
//! Backed by an unbounded tokio channel. Work does not survive a restart;
//! within the process it keeps the queue's redelivery semantics, so a
//! delivery rejected with requeue comes back marked as redelivered.
//! Subscriptions share the receiver and compete for messages.

use crate::envelope::WorkMessage;
use crate::error::{JobError, JobResult};
use crate::metrics::QueueMetrics;
use crate::queue::{Acknowledger, Delivery, DeliveryStream, WorkQueue};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

type Envelope = (Vec<u8>, bool);

/// Work queue living inside the process.
pub struct InMemoryWorkQueue {
    name: String,
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Envelope>>>,
    published: AtomicU64,
    settled: Arc<Settled>,
}

/// Settlement counters shared with the ackers.
#[derive(Debug, Default)]
struct Settled {
    acked: AtomicU64,
    requeued: AtomicU64,
    dropped: AtomicU64,
}

impl InMemoryWorkQueue {
    /// Creates an empty queue.
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            published: AtomicU64::new(0),
            settled: Arc::new(Settled::default()),
        }
    }

    /// Enqueues a raw payload, bypassing envelope encoding.
    pub fn publish_raw(&self, payload: Vec<u8>) -> JobResult<()> {
        self.sender
            .send((payload, false))
            .map_err(|_| JobError::Publish("queue closed".to_string()))?;
        self.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Messages published so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }

    /// Deliveries acknowledged so far.
    pub fn acked(&self) -> u64 {
        self.settled.acked.load(Ordering::SeqCst)
    }

    /// Deliveries rejected with requeue so far.
    pub fn requeued(&self) -> u64 {
        self.settled.requeued.load(Ordering::SeqCst)
    }

    /// Deliveries rejected without requeue so far.
    pub fn dropped(&self) -> u64 {
        self.settled.dropped.load(Ordering::SeqCst)
    }
}

struct InMemoryAcker {
    payload: Vec<u8>,
    sender: mpsc::UnboundedSender<Envelope>,
    settled: Arc<Settled>,
}

#[async_trait]
impl Acknowledger for InMemoryAcker {
    async fn ack(&self) -> JobResult<()> {
        self.settled.acked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn nack(&self, requeue: bool) -> JobResult<()> {
        if requeue {
            self.settled.requeued.fetch_add(1, Ordering::SeqCst);
            self.sender
                .send((self.payload.clone(), true))
                .map_err(|_| JobError::Acknowledge("queue closed".to_string()))
        } else {
            self.settled.dropped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, message: &WorkMessage) -> JobResult<()> {
        self.publish_raw(message.encode()?)?;
        QueueMetrics::published(&self.name, message.item.kind());
        debug!(queue = %self.name, message = %message, "Published work item");
        Ok(())
    }

    async fn subscribe(&self) -> JobResult<DeliveryStream> {
        let receiver = Arc::clone(&self.receiver);
        let sender = self.sender.clone();
        let settled = Arc::clone(&self.settled);

        let stream = futures::stream::unfold(receiver, |receiver| async move {
            let next = receiver.lock().await.recv().await;
            next.map(|envelope| (envelope, receiver))
        })
        .map(move |(payload, redelivered)| {
            let acker = InMemoryAcker {
                payload: payload.clone(),
                sender: sender.clone(),
                settled: Arc::clone(&settled),
            };
            Ok(Delivery::new(payload, redelivered, Box::new(acker)))
        });

        Ok(stream.boxed())
    }
}
