//! Cache key generators for consistent key naming.

use catalog_core::ProductId;

/// Prefix for all cache keys to namespace them.
const CACHE_PREFIX: &str = "catalog";

/// Generate the cache key for a product snapshot.
#[must_use]
pub fn product_by_id(id: ProductId) -> String {
    format!("{CACHE_PREFIX}:product:{id}")
}

/// Pattern matching every cached product snapshot.
#[must_use]
pub fn all_products_pattern() -> String {
    format!("{CACHE_PREFIX}:product:*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_by_id_key() {
        assert_eq!(product_by_id(ProductId(42)), "catalog:product:42");
    }

    #[test]
    fn test_all_products_pattern() {
        assert_eq!(all_products_pattern(), "catalog:product:*");
    }
}
