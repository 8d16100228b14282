//! PostgreSQL product repository implementation.

use crate::{traits::ProductRepository, DatabasePool};
use async_trait::async_trait;
use catalog_core::{
    CatalogError, CatalogResult, NewProduct, Product, ProductFilter, ProductId, UserId,
};
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::debug;

/// Foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Selects a product with its compressed images aggregated in original-image
/// order.
const SELECT_PRODUCT: &str = r#"
    SELECT p.id, p.user_id, p.product_name, p.product_description,
           p.product_images, p.product_price,
           ARRAY(
               SELECT c.compressed_image
               FROM product_compressed_images c
               WHERE c.product_id = p.id
               ORDER BY array_position(p.product_images, c.source_image), c.created_at
           ) AS compressed_product_images
    FROM products p
"#;

/// PostgreSQL product repository implementation.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: Arc<DatabasePool>,
}

impl PgProductRepository {
    /// Creates a new PostgreSQL product repository.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a product.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    user_id: i64,
    product_name: String,
    product_description: String,
    product_images: Vec<String>,
    compressed_product_images: Vec<String>,
    product_price: f64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId(row.id),
            user_id: UserId(row.user_id),
            product_name: row.product_name,
            product_description: row.product_description,
            product_images: row.product_images,
            compressed_product_images: row.compressed_product_images,
            product_price: row.product_price,
        }
    }
}

/// Escapes LIKE wildcards so the name filter matches literally.
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the list query. Unset bounds and an empty name add no predicate.
fn build_list_query(filter: &ProductFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_PRODUCT);
    builder.push(" WHERE p.user_id = ").push_bind(filter.user_id.0);

    if let Some(min) = filter.min_bound() {
        builder.push(" AND p.product_price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_bound() {
        builder.push(" AND p.product_price <= ").push_bind(max);
    }
    if let Some(name) = filter.name_pattern() {
        builder
            .push(" AND p.product_name ILIKE '%' || ")
            .push_bind(escape_like(name))
            .push(" || '%'");
    }

    builder
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: &NewProduct) -> CatalogResult<Product> {
        debug!("Creating product for user: {}", product.user_id);

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products
                (user_id, product_name, product_description, product_images, product_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(product.user_id.0)
        .bind(&product.product_name)
        .bind(&product.product_description)
        .bind(&product.product_images)
        .bind(product.product_price)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(product.clone().into_product(ProductId(id)))
    }

    async fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        debug!("Finding product by id: {}", id);

        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE p.id = $1"))
            .bind(id.0)
            .fetch_optional(self.pool.inner())
            .await?;

        Ok(row.map(Product::from))
    }

    async fn list(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>> {
        debug!("Listing products with filter: {:?}", filter);

        let rows = build_list_query(filter)
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn add_compressed_image(
        &self,
        id: ProductId,
        source_image: &str,
        compressed_image: &str,
    ) -> CatalogResult<bool> {
        debug!("Adding compressed image for product {}: {}", id, source_image);

        let result = sqlx::query(
            r#"
            INSERT INTO product_compressed_images (product_id, source_image, compressed_image)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, source_image) DO NOTHING
            "#,
        )
        .bind(id.0)
        .bind(source_image)
        .bind(compressed_image)
        .execute(self.pool.inner())
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) =>
            {
                Err(CatalogError::not_found("Product", id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> CatalogResult<()> {
        self.pool.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_owner_only() {
        let filter = ProductFilter::for_owner(UserId(7));
        let sql = build_list_query(&filter).into_sql();
        assert!(sql.ends_with("WHERE p.user_id = $1"));
    }

    #[test]
    fn test_list_query_all_predicates() {
        let filter = ProductFilter::for_owner(UserId(7))
            .with_price_range(10.0, 50.0)
            .with_name("shirt");
        let sql = build_list_query(&filter).into_sql();
        assert!(sql.contains("p.product_price >= $2"));
        assert!(sql.contains("p.product_price <= $3"));
        assert!(sql.contains("ILIKE '%' || $4 || '%'"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("shirt"), "shirt");
    }

    #[test]
    fn test_list_query_zero_bounds_skipped() {
        let filter = ProductFilter::for_owner(UserId(7)).with_price_range(0.0, 0.0);
        let sql = build_list_query(&filter).into_sql();
        assert!(!sql.contains("product_price >="));
        assert!(!sql.contains("product_price <="));
        assert!(!sql.contains("ILIKE"));
    }
}
