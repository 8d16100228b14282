//! Catalog Jobs - Image Processing Queue
//!
//! Moves image compression off the request path:
//! - Versioned work envelopes with a tagged payload
//! - A [`WorkQueue`] seam with RabbitMQ and in-process backends
//! - At-least-once delivery with explicit ack and requeue
//! - A background [`ImageProcessor`] with start/stop lifecycle and
//!   reconnect backoff
//!
//! # Architecture
//!
//! ```text
//! ProductService ──publish──▶ WorkQueue ──subscribe──▶ ImageProcessor
//!                              (rabbitmq | memory)        │
//!                                                         ├─▶ ImageCompressor
//!                                                         └─▶ CompressedImageSink
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_jobs::{ImageProcessor, InMemoryWorkQueue, WorkMessage, WorkQueue};
//!
//! let queue = Arc::new(InMemoryWorkQueue::new("image_processing"));
//! queue.publish(&WorkMessage::compress_image(ProductId(1), "mug.jpg")).await?;
//!
//! let processor = ImageProcessor::new(queue, compressor, sink, config, logger);
//! processor.start()?;
//! // ...
//! processor.stop().await?;
//! ```

pub mod compressor;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod processor;
pub mod queue;
pub mod rabbitmq;

pub use compressor::{ImageCompressor, PlaceholderCompressor};
pub use envelope::{WorkItem, WorkMessage, ENVELOPE_VERSION};
pub use error::{JobError, JobResult};
pub use memory::InMemoryWorkQueue;
pub use metrics::{register_metrics, ProcessorMetrics, QueueMetrics};
pub use processor::{
    CompressedImageSink, ImageProcessor, ImageProcessorConfig, ProcessorState, ProcessorStats,
};
pub use queue::{Acknowledger, Delivery, DeliveryStream, WorkQueue};
pub use rabbitmq::RabbitMqWorkQueue;
