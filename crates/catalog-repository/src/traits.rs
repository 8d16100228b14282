//! Repository trait definitions.

use catalog_core::{CatalogResult, NewProduct, Product, ProductFilter, ProductId};
use async_trait::async_trait;

/// Product store.
///
/// The store is the single source of truth for products. Implementations
/// must be safe for concurrent use from many request tasks.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persists a new product and returns it with its assigned identity.
    async fn create(&self, product: &NewProduct) -> CatalogResult<Product>;

    /// Finds a product by ID.
    async fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>>;

    /// Lists the products matching a filter, in store order.
    async fn list(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>>;

    /// Records a compressed image derived from `source_image`.
    ///
    /// Keyed on the source image, so applying the same pair twice leaves a
    /// single entry. Returns `true` when a new entry was written and a
    /// not-found error when the product does not exist.
    async fn add_compressed_image(
        &self,
        id: ProductId,
        source_image: &str,
        compressed_image: &str,
    ) -> CatalogResult<bool>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> CatalogResult<()>;
}
