//! OpenAPI documentation configuration.

use crate::controllers::health_controller::{HealthResponse, ReadinessResponse};
use catalog_core::{ErrorResponse, FieldError, Product, ProductId, UserId};
use catalog_service::CreateProductRequest;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation for the catalog API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Catalog API",
        version = "1.0.0",
        description = "Create, fetch and list catalog products"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        crate::controllers::product_controller::create_product,
        crate::controllers::product_controller::get_product,
        crate::controllers::product_controller::list_products,
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            ProductId,
            UserId,
            Product,
            CreateProductRequest,
            ErrorResponse,
            FieldError,
            HealthResponse,
            ReadinessResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "products", description = "Product endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Security addon for HTTP Basic authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}
