//! Product service trait definition.

use crate::dto::CreateProductRequest;
use async_trait::async_trait;
use catalog_core::{CatalogResult, Product, ProductFilter, ProductId, UserId};
use mockall::automock;

/// Product service.
///
/// Owns the consistency contract between the store, the cache and the
/// image work queue.
#[automock]
#[async_trait]
pub trait ProductService: Send + Sync {
    /// Creates a product owned by `owner` and hands its images to the
    /// image processor.
    async fn create_product(
        &self,
        owner: UserId,
        request: CreateProductRequest,
    ) -> CatalogResult<Product>;

    /// Gets a product by ID, reading through the cache.
    async fn get_product(&self, id: ProductId) -> CatalogResult<Product>;

    /// Lists products matching a filter. Always reads the store.
    async fn list_products(&self, filter: ProductFilter) -> CatalogResult<Vec<Product>>;

    /// Records a compressed image and invalidates the cached product.
    async fn attach_compressed_image(
        &self,
        id: ProductId,
        source_image: &str,
        compressed_image: &str,
    ) -> CatalogResult<bool>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> CatalogResult<()>;
}
