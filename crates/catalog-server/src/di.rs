//! Component wiring.
//!
//! [`AppModuleBuilder`] assembles the store, cache, work queue, product
//! service and image processor into an [`AppModule`]. [`build_module`] does
//! the same from configuration, connecting to the real backends.

use catalog_config::{AppConfig, QueueBackend, StorageConfig};
use catalog_core::{CatalogError, CatalogResult, Logger};
use catalog_jobs::{
    ImageCompressor, ImageProcessor, ImageProcessorConfig, InMemoryWorkQueue,
    PlaceholderCompressor, RabbitMqWorkQueue, WorkQueue,
};
use catalog_repository::{create_pool, DatabasePool, PgProductRepository, ProductRepository};
use catalog_service::{
    CacheInterface, ProductService, ProductServiceImpl, RedisCacheService, DEFAULT_TTL,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default queue name for in-process queues.
const DEFAULT_QUEUE_NAME: &str = "image_processing";

/// Work queue backend owned by the module.
#[derive(Clone)]
pub enum QueueHandle {
    /// Durable broker queue.
    RabbitMq(Arc<RabbitMqWorkQueue>),
    /// In-process queue.
    Memory(Arc<InMemoryWorkQueue>),
}

impl QueueHandle {
    /// Returns the queue behind the publish/subscribe seam.
    pub fn as_queue(&self) -> Arc<dyn WorkQueue> {
        match self {
            Self::RabbitMq(queue) => queue.clone(),
            Self::Memory(queue) => queue.clone(),
        }
    }

    /// Releases broker resources.
    pub async fn close(&self) {
        if let Self::RabbitMq(queue) = self {
            queue.close().await;
        }
    }
}

/// Wired application components.
pub struct AppModule {
    database: Option<Arc<DatabasePool>>,
    queue: QueueHandle,
    product_service: Arc<ProductServiceImpl>,
    processor: Arc<ImageProcessor>,
}

impl AppModule {
    /// Product service used by the HTTP layer.
    pub fn product_service(&self) -> Arc<dyn ProductService> {
        self.product_service.clone()
    }

    /// Background image processor.
    pub fn processor(&self) -> &Arc<ImageProcessor> {
        &self.processor
    }

    /// Work queue shared by the service and the processor.
    pub fn queue(&self) -> Arc<dyn WorkQueue> {
        self.queue.as_queue()
    }

    /// Stops the processor and releases backend connections.
    ///
    /// The processor drains first so its last acknowledgements reach the
    /// queue before the connection closes.
    pub async fn shutdown(&self) {
        if let Err(e) = self.processor.stop().await {
            warn!(error = %e, "Image processor did not stop cleanly");
        }
        self.queue.close().await;
        if let Some(database) = &self.database {
            database.close().await;
        }
        info!("Application components shut down");
    }
}

/// Builder for [`AppModule`].
pub struct AppModuleBuilder {
    service_name: String,
    database: Option<Arc<DatabasePool>>,
    repository: Option<Arc<dyn ProductRepository>>,
    cache: Option<Arc<dyn CacheInterface>>,
    queue: Option<QueueHandle>,
    compressor: Option<Arc<dyn ImageCompressor>>,
    cache_ttl: Duration,
    processor_config: ImageProcessorConfig,
}

impl AppModuleBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            service_name: "catalog".to_string(),
            database: None,
            repository: None,
            cache: None,
            queue: None,
            compressor: None,
            cache_ttl: DEFAULT_TTL,
            processor_config: ImageProcessorConfig::default(),
        }
    }

    /// Sets the service name attached to component log spans.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Uses PostgreSQL as the product store.
    pub fn with_database_pool(mut self, pool: Arc<DatabasePool>) -> Self {
        self.repository = Some(Arc::new(PgProductRepository::new(pool.clone())));
        self.database = Some(pool);
        self
    }

    /// Uses an explicit product store.
    pub fn with_repository(mut self, repository: Arc<dyn ProductRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets the cache. Defaults to a disabled cache.
    pub fn with_cache(mut self, cache: Arc<dyn CacheInterface>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the product cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the work queue. Defaults to an in-process queue.
    pub fn with_queue(mut self, queue: QueueHandle) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Sets the image compressor.
    pub fn with_compressor(mut self, compressor: Arc<dyn ImageCompressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Sets processor timing.
    pub fn with_processor_config(mut self, config: ImageProcessorConfig) -> Self {
        self.processor_config = config;
        self
    }

    /// Wires the components. The processor is created but not started.
    pub fn build(self) -> CatalogResult<AppModule> {
        let repository = self.repository.ok_or_else(|| {
            CatalogError::Configuration("a product store is required".to_string())
        })?;
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(RedisCacheService::disabled()));
        let queue = self.queue.unwrap_or_else(|| {
            QueueHandle::Memory(Arc::new(InMemoryWorkQueue::new(DEFAULT_QUEUE_NAME)))
        });
        let compressor = self.compressor.unwrap_or_else(|| {
            Arc::new(PlaceholderCompressor::new(
                &StorageConfig::default(),
                Duration::ZERO,
            ))
        });

        let product_service = Arc::new(
            ProductServiceImpl::new(
                repository,
                cache,
                queue.as_queue(),
                Logger::new(&self.service_name, "product_service"),
            )
            .with_cache_ttl(self.cache_ttl),
        );

        let processor = Arc::new(ImageProcessor::new(
            queue.as_queue(),
            compressor,
            product_service.clone(),
            self.processor_config,
            Logger::new(&self.service_name, "image_processor"),
        ));

        Ok(AppModule {
            database: self.database,
            queue,
            product_service,
            processor,
        })
    }
}

impl Default for AppModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Connects the configured backends and wires the module.
pub async fn build_module(config: &AppConfig) -> CatalogResult<AppModule> {
    let database = create_pool(&config.database).await?;
    if config.database.run_migrations {
        database.run_migrations().await?;
    }

    let cache = RedisCacheService::from_config(&config.redis)?;
    if !config.redis.enabled {
        info!("Product cache disabled");
    }

    let queue = match config.queue.backend {
        QueueBackend::Rabbitmq => {
            let queue = RabbitMqWorkQueue::connect(&config.queue)
                .await
                .map_err(|e| CatalogError::Queue(e.to_string()))?;
            QueueHandle::RabbitMq(Arc::new(queue))
        }
        QueueBackend::Memory => {
            warn!("Using in-process work queue; pending work is lost on restart");
            QueueHandle::Memory(Arc::new(InMemoryWorkQueue::new(
                config.queue.queue_name.clone(),
            )))
        }
    };

    let compressor = PlaceholderCompressor::new(
        &config.storage,
        config.processor.simulated_latency(),
    );

    AppModuleBuilder::new()
        .with_service_name(config.observability.service_name.clone())
        .with_database_pool(database)
        .with_cache(Arc::new(cache))
        .with_cache_ttl(config.redis.product_ttl())
        .with_queue(queue)
        .with_compressor(Arc::new(compressor))
        .with_processor_config(ImageProcessorConfig::from(&config.processor))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{ProductId, UserId};
    use catalog_repository::InMemoryProductRepository;
    use catalog_service::CreateProductRequest;

    fn in_memory_builder() -> (AppModuleBuilder, Arc<InMemoryWorkQueue>) {
        let queue = Arc::new(InMemoryWorkQueue::new("images"));
        let builder = AppModuleBuilder::new()
            .with_repository(Arc::new(InMemoryProductRepository::new()))
            .with_queue(QueueHandle::Memory(queue.clone()));
        (builder, queue)
    }

    fn request(images: &[&str]) -> CreateProductRequest {
        CreateProductRequest {
            product_name: "Lamp".to_string(),
            product_description: None,
            product_price: 40.0,
            product_images: images.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_build_requires_store() {
        let result = AppModuleBuilder::new().build();
        assert!(matches!(result, Err(CatalogError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_processor_not_started_by_build() {
        let (builder, _) = in_memory_builder();
        let module = builder.build().unwrap();
        assert!(!module.processor().is_running());
    }

    #[tokio::test]
    async fn test_service_and_processor_share_queue() {
        let (builder, queue) = in_memory_builder();
        let module = builder.build().unwrap();

        let service = module.product_service();
        let product = service
            .create_product(UserId(1), request(&["a/lamp.png", "b/shade.png"]))
            .await
            .unwrap();
        assert_eq!(queue.published(), 2);

        module.processor().start().unwrap();

        let mut attached = Vec::new();
        for _ in 0..100 {
            attached = service
                .get_product(product.id)
                .await
                .unwrap()
                .compressed_product_images;
            if attached.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(attached.len(), 2);
        assert!(attached[0].ends_with(&format!("/{}/lamp.png", product.id)));

        module.shutdown().await;
        assert!(!module.processor().is_running());
        assert_eq!(queue.acked(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_without_start() {
        let (builder, _) = in_memory_builder();
        let module = builder.build().unwrap();
        module.shutdown().await;
        assert!(module.product_service().get_product(ProductId(1)).await.is_err());
    }
}
