//! Product service implementation.

use crate::cache::{cache_keys, CacheExt, CacheInterface, DEFAULT_TTL};
use crate::dto::CreateProductRequest;
use crate::metrics::ServiceMetrics;
use crate::product_service::ProductService;
use async_trait::async_trait;
use catalog_core::{
    CatalogError, CatalogResult, Logger, Product, ProductFilter, ProductId, UserId, ValidateExt,
};
use catalog_jobs::{CompressedImageSink, WorkMessage, WorkQueue};
use catalog_repository::ProductRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

/// Product service backed by a store, a cache and a work queue.
///
/// The cache is never authoritative. Reads fall through to the store on
/// a miss or on any cache failure, and writes delete the cached snapshot.
pub struct ProductServiceImpl {
    repository: Arc<dyn ProductRepository>,
    cache: Arc<dyn CacheInterface>,
    queue: Arc<dyn WorkQueue>,
    cache_ttl: Duration,
    logger: Logger,
}

impl ProductServiceImpl {
    /// Creates a new product service.
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        cache: Arc<dyn CacheInterface>,
        queue: Arc<dyn WorkQueue>,
        logger: Logger,
    ) -> Self {
        Self {
            repository,
            cache,
            queue,
            cache_ttl: DEFAULT_TTL,
            logger,
        }
    }

    /// Sets the TTL of cached product snapshots.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Publishes one compression work item per original image.
    ///
    /// Failures are logged and skipped; the product stays valid without
    /// compressed images.
    async fn publish_image_work(&self, product: &Product) {
        for image_ref in &product.product_images {
            let message = WorkMessage::compress_image(product.id, image_ref.as_str());
            match self.queue.publish(&message).await {
                Ok(()) => debug!(product_id = %product.id, image_ref = %image_ref, "Queued image work"),
                Err(e) => {
                    ServiceMetrics::publish_failed(self.queue.name());
                    warn!(
                        product_id = %product.id,
                        image_ref = %image_ref,
                        error = %e,
                        "Failed to queue image work"
                    );
                }
            }
        }
    }

    async fn cached_product(&self, key: &str) -> Option<Product> {
        match self.cache.get_json::<Product>(key).await {
            Ok(Some(product)) => {
                ServiceMetrics::cache_hit();
                Some(product)
            }
            Ok(None) => {
                ServiceMetrics::cache_miss();
                None
            }
            Err(e) => {
                ServiceMetrics::cache_error("get");
                warn!(key, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    async fn invalidate(&self, id: ProductId) {
        let key = cache_keys::product_by_id(id);
        if let Err(e) = self.cache.delete(&key).await {
            ServiceMetrics::cache_error("delete");
            warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }
}

impl std::fmt::Debug for ProductServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductServiceImpl")
            .field("queue", &self.queue.name())
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProductService for ProductServiceImpl {
    async fn create_product(
        &self,
        owner: UserId,
        request: CreateProductRequest,
    ) -> CatalogResult<Product> {
        async {
            request.validate_request()?;

            let product = self
                .repository
                .create(&request.into_new_product(owner))
                .await?;

            info!(
                product_id = %product.id,
                user_id = %owner,
                images = product.product_images.len(),
                "Product created"
            );
            ServiceMetrics::product_created(product.product_images.len());

            self.publish_image_work(&product).await;
            Ok(product)
        }
        .instrument(self.logger.operation("create_product"))
        .await
    }

    async fn get_product(&self, id: ProductId) -> CatalogResult<Product> {
        async {
            let key = cache_keys::product_by_id(id);

            if let Some(product) = self.cached_product(&key).await {
                debug!(product_id = %id, "Cache hit for product");
                return Ok(product);
            }

            let product = self
                .repository
                .find_by_id(id)
                .await?
                .ok_or_else(|| CatalogError::not_found("Product", id))?;

            if let Err(e) = self.cache.set_json(&key, &product, self.cache_ttl).await {
                ServiceMetrics::cache_error("set");
                warn!(key = %key, error = %e, "Cache write failed");
            }

            Ok(product)
        }
        .instrument(self.logger.operation("get_product"))
        .await
    }

    async fn list_products(&self, filter: ProductFilter) -> CatalogResult<Vec<Product>> {
        async {
            let products = self.repository.list(&filter).await?;
            debug!(user_id = %filter.user_id, count = products.len(), "Listed products");
            Ok(products)
        }
        .instrument(self.logger.operation("list_products"))
        .await
    }

    async fn attach_compressed_image(
        &self,
        id: ProductId,
        source_image: &str,
        compressed_image: &str,
    ) -> CatalogResult<bool> {
        async {
            let added = self
                .repository
                .add_compressed_image(id, source_image, compressed_image)
                .await?;
            self.invalidate(id).await;

            debug!(product_id = %id, source_image, added, "Recorded compressed image");
            Ok(added)
        }
        .instrument(self.logger.operation("attach_compressed_image"))
        .await
    }

    async fn health_check(&self) -> CatalogResult<()> {
        self.repository.health_check().await
    }
}

#[async_trait]
impl CompressedImageSink for ProductServiceImpl {
    async fn attach_compressed_image(
        &self,
        product_id: ProductId,
        source_image: &str,
        compressed_image: &str,
    ) -> CatalogResult<bool> {
        ProductService::attach_compressed_image(self, product_id, source_image, compressed_image)
            .await
    }
}
