//! Product model and list filter.

use crate::{ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// `compressed_product_images` is filled in asynchronously by the image
/// processor, so a freshly created product has it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Product {
    pub id: ProductId,
    pub user_id: UserId,
    pub product_name: String,
    #[serde(default)]
    pub product_description: String,
    #[serde(default)]
    pub product_images: Vec<String>,
    #[serde(default)]
    pub compressed_product_images: Vec<String>,
    pub product_price: f64,
}

impl Product {
    /// Returns true when every original image has a compressed counterpart.
    #[must_use]
    pub fn is_fully_processed(&self) -> bool {
        self.compressed_product_images.len() >= self.product_images.len()
    }
}

/// A product that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub user_id: UserId,
    pub product_name: String,
    pub product_description: String,
    pub product_images: Vec<String>,
    pub product_price: f64,
}

impl NewProduct {
    /// Attaches the Store-assigned identity.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            user_id: self.user_id,
            product_name: self.product_name,
            product_description: self.product_description,
            product_images: self.product_images,
            compressed_product_images: Vec::new(),
            product_price: self.product_price,
        }
    }
}

/// Filtering criteria for listing products.
///
/// The owner match is mandatory. Price bounds are inclusive and only take
/// effect when strictly positive, so a bound of `0.0` means "unset". The
/// name filter is a case-insensitive substring match, skipped when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub user_id: UserId,
    pub min_price: f64,
    pub max_price: f64,
    pub product_name: String,
}

impl ProductFilter {
    /// Creates a filter that matches every product of one owner.
    #[must_use]
    pub fn for_owner(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Sets the inclusive price range.
    #[must_use]
    pub fn with_price_range(mut self, min_price: f64, max_price: f64) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    /// Sets the name substring.
    #[must_use]
    pub fn with_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = product_name.into();
        self
    }

    /// Lower price bound, if set.
    #[must_use]
    pub fn min_bound(&self) -> Option<f64> {
        (self.min_price > 0.0).then_some(self.min_price)
    }

    /// Upper price bound, if set.
    #[must_use]
    pub fn max_bound(&self) -> Option<f64> {
        (self.max_price > 0.0).then_some(self.max_price)
    }

    /// Name substring, if set.
    #[must_use]
    pub fn name_pattern(&self) -> Option<&str> {
        (!self.product_name.is_empty()).then_some(self.product_name.as_str())
    }

    /// Evaluates the filter against a product in memory.
    ///
    /// Mirrors the SQL the Postgres repository generates.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if product.user_id != self.user_id {
            return false;
        }
        if self.min_bound().is_some_and(|min| product.product_price < min) {
            return false;
        }
        if self.max_bound().is_some_and(|max| product.product_price > max) {
            return false;
        }
        match self.name_pattern() {
            Some(pattern) => product
                .product_name
                .to_lowercase()
                .contains(&pattern.to_lowercase()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(user: i64, name: &str, price: f64) -> Product {
        Product {
            id: ProductId(1),
            user_id: UserId(user),
            product_name: name.to_string(),
            product_description: String::new(),
            product_images: vec![],
            compressed_product_images: vec![],
            product_price: price,
        }
    }

    #[test]
    fn test_filter_requires_owner() {
        let filter = ProductFilter::for_owner(UserId(1));
        assert!(filter.matches(&product(1, "Lamp", 20.0)));
        assert!(!filter.matches(&product(2, "Lamp", 20.0)));
    }

    #[test]
    fn test_filter_price_bounds_inclusive() {
        let filter = ProductFilter::for_owner(UserId(1)).with_price_range(10.0, 50.0);
        assert!(filter.matches(&product(1, "a", 10.0)));
        assert!(filter.matches(&product(1, "b", 50.0)));
        assert!(!filter.matches(&product(1, "c", 9.99)));
        assert!(!filter.matches(&product(1, "d", 50.01)));
    }

    #[test]
    fn test_filter_zero_bound_is_unset() {
        let filter = ProductFilter::for_owner(UserId(1)).with_price_range(0.0, 50.0);
        assert_eq!(filter.min_bound(), None);
        assert!(filter.matches(&product(1, "cheap", 0.5)));

        let filter = ProductFilter::for_owner(UserId(1)).with_price_range(10.0, 0.0);
        assert_eq!(filter.max_bound(), None);
        assert!(filter.matches(&product(1, "pricey", 10_000.0)));
    }

    #[test]
    fn test_filter_name_case_insensitive_substring() {
        let filter = ProductFilter::for_owner(UserId(1)).with_name("shirt");
        assert!(filter.matches(&product(1, "Blue Shirt", 15.0)));
        assert!(!filter.matches(&product(1, "Blue Jeans", 15.0)));
    }

    #[test]
    fn test_product_json_field_names() {
        let json = serde_json::to_value(product(3, "Mug", 4.5)).unwrap();
        assert_eq!(json["user_id"], 3);
        assert_eq!(json["product_name"], "Mug");
        assert!(json["compressed_product_images"].is_array());
        assert_eq!(json["product_price"], 4.5);
    }

    #[test]
    fn test_new_product_into_product() {
        let new = NewProduct {
            user_id: UserId(1),
            product_name: "Mug".to_string(),
            product_description: "Ceramic".to_string(),
            product_images: vec!["mug.jpg".to_string()],
            product_price: 9.0,
        };
        let product = new.into_product(ProductId(11));
        assert_eq!(product.id, ProductId(11));
        assert!(product.compressed_product_images.is_empty());
        assert!(!product.is_fully_processed());
    }
}
