//! In-memory product repository.
//!
//! Used when running without PostgreSQL and by tests across the workspace.
//! Filtering goes through [`ProductFilter::matches`], which applies the same
//! predicates as the SQL repository.

use crate::traits::ProductRepository;
use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult, NewProduct, Product, ProductFilter, ProductId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

struct StoredProduct {
    product: Product,
    compressed: BTreeMap<String, String>,
}

impl StoredProduct {
    fn snapshot(&self) -> Product {
        let mut product = self.product.clone();
        // One entry per source, at its first position.
        let mut seen = BTreeSet::new();
        let known = product
            .product_images
            .iter()
            .filter(|source| seen.insert(*source))
            .filter_map(|source| self.compressed.get(source).cloned());
        // Sources not listed on the product sort last, like NULL positions in SQL.
        let unknown = self
            .compressed
            .iter()
            .filter(|(source, _)| !product.product_images.contains(source))
            .map(|(_, compressed)| compressed.clone());
        product.compressed_product_images = known.chain(unknown).collect();
        product
    }
}

/// Product repository backed by a map.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<i64, StoredProduct>>,
    next_id: AtomicUsize,
    reads: AtomicUsize,
}

impl InMemoryProductRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_id` calls served so far.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of stored products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    /// Returns true if no product is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: &NewProduct) -> CatalogResult<Product> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let product = product.clone().into_product(ProductId(id));
        self.products.write().insert(
            id,
            StoredProduct {
                product: product.clone(),
                compressed: BTreeMap::new(),
            },
        );
        Ok(product)
    }

    async fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.read().get(&id.0).map(StoredProduct::snapshot))
    }

    async fn list(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>> {
        Ok(self
            .products
            .read()
            .values()
            .map(StoredProduct::snapshot)
            .filter(|p| filter.matches(p))
            .collect())
    }

    async fn add_compressed_image(
        &self,
        id: ProductId,
        source_image: &str,
        compressed_image: &str,
    ) -> CatalogResult<bool> {
        let mut products = self.products.write();
        let stored = products
            .get_mut(&id.0)
            .ok_or_else(|| CatalogError::not_found("Product", id))?;

        if stored.compressed.contains_key(source_image) {
            return Ok(false);
        }
        stored
            .compressed
            .insert(source_image.to_string(), compressed_image.to_string());
        Ok(true)
    }

    async fn health_check(&self) -> CatalogResult<()> {
        Ok(())
    }
}
