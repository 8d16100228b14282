//! Product request DTOs.

use catalog_core::validation::rules;
use catalog_core::{NewProduct, ProductFilter, UserId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request to create a product.
///
/// The owner comes from the request principal, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(custom(function = "rules::not_blank"))]
    pub product_name: String,

    #[serde(default)]
    pub product_description: Option<String>,

    #[validate(custom(function = "rules::positive_price"))]
    pub product_price: f64,

    #[serde(default)]
    #[validate(custom(function = "rules::image_refs"))]
    pub product_images: Vec<String>,
}

impl CreateProductRequest {
    /// Builds the Store input for an owner.
    #[must_use]
    pub fn into_new_product(self, owner: UserId) -> NewProduct {
        NewProduct {
            user_id: owner,
            product_name: self.product_name.trim().to_string(),
            product_description: self.product_description.unwrap_or_default(),
            product_images: self.product_images,
            product_price: self.product_price,
        }
    }
}

/// Query string of the product listing.
///
/// Values are kept as raw strings and parsed leniently: anything missing or
/// unparseable counts as zero or empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Owner to list products for.
    pub user_id: Option<String>,
    /// Inclusive lower price bound, ignored when not positive.
    pub min_price: Option<String>,
    /// Inclusive upper price bound, ignored when not positive.
    pub max_price: Option<String>,
    /// Case-insensitive name substring.
    pub product_name: Option<String>,
}

fn parse_or_default<T: std::str::FromStr + Default>(value: Option<&str>) -> T {
    value
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or_default()
}

impl ProductListQuery {
    /// Converts the query into a store filter.
    #[must_use]
    pub fn into_filter(self) -> ProductFilter {
        let min_price: f64 = parse_or_default(self.min_price.as_deref());
        let max_price: f64 = parse_or_default(self.max_price.as_deref());

        ProductFilter {
            user_id: UserId(parse_or_default(self.user_id.as_deref())),
            min_price: if min_price.is_finite() { min_price } else { 0.0 },
            max_price: if max_price.is_finite() { max_price } else { 0.0 },
            product_name: self.product_name.unwrap_or_default(),
        }
    }
}

impl From<ProductListQuery> for ProductFilter {
    fn from(query: ProductListQuery) -> Self {
        query.into_filter()
    }
}
