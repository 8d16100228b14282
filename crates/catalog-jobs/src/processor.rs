//! Background image processor.
//!
//! Drains the work queue on its own task:
//!
//! ```text
//! Stopped --start--> Idle --subscribed--> Consuming --delivery--> Processing
//!                     ^                      |    ^                   |
//!                     +--- stream broken ----+    +------ settled ----+
//! ```
//!
//! Cancellation is cooperative and checked between receives, so a delivery
//! being processed when [`ImageProcessor::stop`] is called may finish within
//! the drain timeout. After that the task is aborted and the unacknowledged
//! delivery is redelivered by the broker.

use crate::compressor::ImageCompressor;
use crate::envelope::{WorkItem, WorkMessage};
use crate::error::{JobError, JobResult};
use crate::metrics::ProcessorMetrics;
use crate::queue::{Delivery, WorkQueue};
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use catalog_config::ProcessorConfig;
use catalog_core::{CatalogResult, Logger, ProductId};
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Destination of compressed image references.
///
/// Writing the same `(product, source_image)` pair twice must leave a single
/// entry, since deliveries can repeat.
#[async_trait]
pub trait CompressedImageSink: Send + Sync {
    /// Records a compressed image. Returns `true` if it was new.
    async fn attach_compressed_image(
        &self,
        product_id: ProductId,
        source_image: &str,
        compressed_image: &str,
    ) -> CatalogResult<bool>;
}

/// Processor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    /// Not running.
    Stopped,
    /// Running but not subscribed (starting or reconnecting).
    Idle,
    /// Waiting for the next delivery.
    Consuming,
    /// Handling a delivery.
    Processing,
}

impl ProcessorState {
    fn as_gauge(self) -> u8 {
        match self {
            ProcessorState::Stopped => 0,
            ProcessorState::Idle => 1,
            ProcessorState::Consuming => 2,
            ProcessorState::Processing => 3,
        }
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessorState::Stopped => "stopped",
            ProcessorState::Idle => "idle",
            ProcessorState::Consuming => "consuming",
            ProcessorState::Processing => "processing",
        };
        f.write_str(name)
    }
}

/// Processor configuration.
#[derive(Debug, Clone)]
pub struct ImageProcessorConfig {
    /// Upper bound on how long stop waits for the task.
    pub drain_timeout: Duration,

    /// First reconnect or requeue delay.
    pub backoff_initial: Duration,

    /// Largest reconnect or requeue delay.
    pub backoff_max: Duration,
}

impl Default for ImageProcessorConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(30),
            backoff_initial: Duration::from_millis(500),
            backoff_max: Duration::from_secs(30),
        }
    }
}

impl From<&ProcessorConfig> for ImageProcessorConfig {
    fn from(config: &ProcessorConfig) -> Self {
        Self {
            drain_timeout: config.drain_timeout(),
            backoff_initial: config.backoff_initial(),
            backoff_max: config.backoff_max(),
        }
    }
}

/// Processor statistics.
#[derive(Debug, Clone)]
pub struct ProcessorStats {
    pub id: String,
    pub state: ProcessorState,
    pub processed: u64,
    pub failed: u64,
}

/// State shared between the handle and the running task.
struct Shared {
    id: String,
    queue: Arc<dyn WorkQueue>,
    compressor: Arc<dyn ImageCompressor>,
    sink: Arc<dyn CompressedImageSink>,
    config: ImageProcessorConfig,
    logger: Logger,
    state: RwLock<ProcessorState>,
    retry_backoff: Mutex<ExponentialBackoff>,
    processed: AtomicU64,
    failed: AtomicU64,
}

/// Queue consumer with an explicit start/stop lifecycle.
pub struct ImageProcessor {
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ImageProcessor {
    /// Creates a stopped processor.
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        compressor: Arc<dyn ImageCompressor>,
        sink: Arc<dyn CompressedImageSink>,
        config: ImageProcessorConfig,
        logger: Logger,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let retry_backoff = Mutex::new(new_backoff(&config));

        Self {
            shared: Arc::new(Shared {
                id: format!("image-processor-{}", Uuid::new_v4()),
                queue,
                compressor,
                sink,
                config,
                logger,
                state: RwLock::new(ProcessorState::Stopped),
                retry_backoff,
                processed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
            shutdown_tx,
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Spawns the consumer task.
    pub fn start(&self) -> JobResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(JobError::Worker("Image processor already running".to_string()));
        }

        info!(
            processor_id = %self.shared.id,
            queue = %self.shared.queue.name(),
            "Starting image processor"
        );

        let shutdown_rx = self.shutdown_tx.subscribe();
        let shared = Arc::clone(&self.shared);
        let span = self.shared.logger.span().clone();
        shared.set_state(ProcessorState::Idle);

        let handle = tokio::spawn(shared.run(shutdown_rx).instrument(span));
        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Signals cancellation and waits up to the drain timeout for the task.
    pub async fn stop(&self) -> JobResult<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        info!(processor_id = %self.shared.id, "Stopping image processor...");
        let _ = self.shutdown_tx.send(());

        let handle = self.handle.lock().take();
        if let Some(mut handle) = handle {
            match timeout(self.shared.config.drain_timeout, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(processor_id = %self.shared.id, error = %e, "Image processor task failed"),
                Err(_) => {
                    warn!(
                        processor_id = %self.shared.id,
                        drain_timeout = ?self.shared.config.drain_timeout,
                        "Drain timeout elapsed, aborting in-flight work"
                    );
                    handle.abort();
                }
            }
        }

        self.shared.set_state(ProcessorState::Stopped);
        self.running.store(false, Ordering::SeqCst);

        info!(
            processor_id = %self.shared.id,
            processed = self.shared.processed.load(Ordering::Relaxed),
            failed = self.shared.failed.load(Ordering::Relaxed),
            "Image processor stopped"
        );
        Ok(())
    }

    /// Check if the processor is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessorState {
        *self.shared.state.read()
    }

    /// Get processor statistics.
    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            id: self.shared.id.clone(),
            state: self.state(),
            processed: self.shared.processed.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
        }
    }
}

/// Backoff shared by reconnects and requeued deliveries. Never gives up.
fn new_backoff(config: &ImageProcessorConfig) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(config.backoff_initial)
        .with_max_interval(config.backoff_max)
        .with_max_elapsed_time(None)
        .build()
}

impl Shared {
    fn set_state(&self, state: ProcessorState) {
        *self.state.write() = state;
        ProcessorMetrics::state(&self.id, state.as_gauge());
    }

    async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut backoff = new_backoff(&self.config);

        'subscribe: loop {
            self.set_state(ProcessorState::Idle);

            let subscription = tokio::select! {
                _ = shutdown.recv() => break 'subscribe,
                result = self.queue.subscribe() => result,
            };

            let mut deliveries = match subscription {
                Ok(stream) => {
                    backoff.reset();
                    stream
                }
                Err(e) => {
                    warn!(processor_id = %self.id, error = %e, "Failed to subscribe to work queue");
                    if !self.wait_before_reconnect(&mut backoff, &mut shutdown).await {
                        break 'subscribe;
                    }
                    continue;
                }
            };

            self.set_state(ProcessorState::Consuming);
            debug!(processor_id = %self.id, "Consuming work queue");

            loop {
                let next = tokio::select! {
                    _ = shutdown.recv() => break 'subscribe,
                    next = deliveries.next() => next,
                };

                match next {
                    Some(Ok(delivery)) => {
                        self.set_state(ProcessorState::Processing);
                        let span = self.logger.operation("process");
                        let keep_running = self.handle(delivery, &mut shutdown).instrument(span).await;
                        if !keep_running {
                            break 'subscribe;
                        }
                        self.set_state(ProcessorState::Consuming);
                    }
                    Some(Err(e)) => {
                        warn!(processor_id = %self.id, error = %e, "Work queue subscription failed");
                        break;
                    }
                    None => {
                        info!(processor_id = %self.id, "Work queue closed");
                        break;
                    }
                }
            }

            if !self.wait_before_reconnect(&mut backoff, &mut shutdown).await {
                break 'subscribe;
            }
        }

        self.set_state(ProcessorState::Stopped);
        debug!(processor_id = %self.id, "Image processor task exited");
    }

    /// Sleeps for the next backoff interval. Returns false if shutdown was
    /// requested meanwhile.
    async fn wait_before_reconnect(
        &self,
        backoff: &mut ExponentialBackoff,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> bool {
        self.set_state(ProcessorState::Idle);
        ProcessorMetrics::reconnect(self.queue.name());

        let delay = backoff.next_backoff().unwrap_or(self.config.backoff_max);
        debug!(processor_id = %self.id, delay = ?delay, "Reconnecting to work queue");

        tokio::select! {
            _ = shutdown.recv() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Decodes, processes and settles one delivery. Returns false if
    /// shutdown was requested while waiting to requeue.
    async fn handle(&self, delivery: Delivery, shutdown: &mut broadcast::Receiver<()>) -> bool {
        let started = Instant::now();
        let queue = self.queue.name();

        let result = match WorkMessage::decode(delivery.payload()) {
            Ok(message) => {
                debug!(message = %message, redelivered = delivery.redelivered(), "Processing work item");
                self.process(&message).await.map(|()| message)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(message) => {
                self.retry_backoff.lock().reset();
                self.processed.fetch_add(1, Ordering::Relaxed);
                ProcessorMetrics::processed(queue, message.item.kind(), started.elapsed());
                if let Err(e) = delivery.ack().await {
                    error!(message = %message, error = %e, "Failed to acknowledge work item");
                }
                true
            }
            Err(e) if e.is_retryable() => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                ProcessorMetrics::failed(queue, "retryable", started.elapsed());

                let delay = self
                    .retry_backoff
                    .lock()
                    .next_backoff()
                    .unwrap_or(self.config.backoff_max);
                warn!(error = %e, redelivered = delivery.redelivered(), delay = ?delay, "Work item failed, requeueing after delay");

                // Requeue right away on shutdown so the item is not held
                // past the drain.
                let keep_running = tokio::select! {
                    _ = shutdown.recv() => false,
                    _ = tokio::time::sleep(delay) => true,
                };

                ProcessorMetrics::requeued(queue);
                if let Err(e) = delivery.nack(true).await {
                    error!(error = %e, "Failed to requeue work item");
                }
                keep_running
            }
            Err(e) => {
                let reason = if e.is_decode_failure() { "decode" } else { "rejected" };
                error!(error = %e, reason, redelivered = delivery.redelivered(), "Work item cannot be processed, rejecting");
                self.failed.fetch_add(1, Ordering::Relaxed);
                ProcessorMetrics::failed(queue, reason, started.elapsed());
                if let Err(e) = delivery.nack(false).await {
                    error!(error = %e, "Failed to reject work item");
                }
                true
            }
        }
    }

    async fn process(&self, message: &WorkMessage) -> JobResult<()> {
        match &message.item {
            WorkItem::CompressImage {
                product_id,
                image_ref,
            } => {
                let outcome = self.compress_image(*product_id, image_ref).await;

                info!(
                    image_ref = %image_ref,
                    product_id = %product_id,
                    success = outcome.is_ok(),
                    "image_processing"
                );

                outcome.map(|added| {
                    if !added {
                        debug!(product_id = %product_id, image_ref = %image_ref, "Compressed image already recorded");
                    }
                })
            }
        }
    }

    async fn compress_image(&self, product_id: ProductId, image_ref: &str) -> JobResult<bool> {
        let compressed = self.compressor.compress(product_id, image_ref).await?;
        let added = self
            .sink
            .attach_compressed_image(product_id, image_ref, &compressed)
            .await?;
        Ok(added)
    }
}
