//! Image transformation.
//!
//! [`PlaceholderCompressor`] stands in for a real encoder: it waits for the
//! configured latency and derives the compressed image's object URL from the
//! storage settings.

use crate::error::JobResult;
use async_trait::async_trait;
use catalog_config::StorageConfig;
use catalog_core::ProductId;
use std::time::Duration;

/// Produces a compressed rendition of an image and returns its reference.
#[async_trait]
pub trait ImageCompressor: Send + Sync {
    /// Compresses `image_ref` for a product.
    ///
    /// Must be deterministic for a given input, since redelivered work calls
    /// it again for the same image.
    async fn compress(&self, product_id: ProductId, image_ref: &str) -> JobResult<String>;
}

/// Compressor that simulates work and writes nothing.
#[derive(Debug, Clone)]
pub struct PlaceholderCompressor {
    bucket: String,
    region: String,
    prefix: String,
    latency: Duration,
}

impl PlaceholderCompressor {
    /// Creates a compressor for a storage location.
    pub fn new(storage: &StorageConfig, latency: Duration) -> Self {
        Self {
            bucket: storage.bucket.clone(),
            region: storage.region.clone(),
            prefix: storage.compressed_prefix.trim_matches('/').to_string(),
            latency,
        }
    }

    /// Object URL the compressed rendition of `image_ref` is stored under.
    pub fn compressed_ref(&self, product_id: ProductId, image_ref: &str) -> String {
        let path = image_ref.split(['?', '#']).next().unwrap_or_default();
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let file_name = if file_name.is_empty() { "image" } else { file_name };

        format!(
            "https://{}.s3.{}.amazonaws.com/{}/{}/{}",
            self.bucket, self.region, self.prefix, product_id, file_name
        )
    }
}

#[async_trait]
impl ImageCompressor for PlaceholderCompressor {
    async fn compress(&self, product_id: ProductId, image_ref: &str) -> JobResult<String> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.compressed_ref(product_id, image_ref))
    }
}
