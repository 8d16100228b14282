//! Main application router.

use crate::{
    controllers::{health_controller, product_controller},
    middleware::{
        basic_auth_middleware, logging_middleware, rate_limit_middleware, AuthMiddlewareState,
        Authenticator, RateLimitState,
    },
    openapi::ApiDoc,
    state::AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Json, Router,
};
use catalog_config::ServerConfig;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;

/// Creates the main application router.
pub fn create_router(
    state: AppState,
    authenticator: Arc<dyn Authenticator>,
    server_config: &ServerConfig,
) -> Router {
    let cors = create_cors_layer(server_config);
    let auth_state = AuthMiddlewareState::new(authenticator);

    let mut api_router = Router::new()
        .nest("/products", product_controller::router())
        .layer(middleware::from_fn_with_state(auth_state, basic_auth_middleware));

    match RateLimitState::per_minute(server_config.rate_limit_per_minute) {
        Some(limit) => {
            api_router =
                api_router.layer(middleware::from_fn_with_state(limit, rate_limit_middleware));
        }
        None => info!("API rate limiting disabled"),
    }

    let router = Router::new()
        // Health endpoints (no auth required)
        .merge(health_controller::router())
        // API v1
        .nest("/api/v1", api_router)
        // OpenAPI document
        .route("/api-docs/openapi.json", get(openapi_json))
        // Root endpoint
        .route("/", get(root))
        .with_state(state)
        .layer(DefaultBodyLimit::max(server_config.max_body_size))
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging_middleware))
        .layer(CatchPanicLayer::new());

    info!(
        rate_limit_per_minute = server_config.rate_limit_per_minute,
        "Router created with product endpoints and OpenAPI document at /api-docs/openapi.json"
    );
    router
}

/// Creates a CORS layer based on server configuration.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if !server_config.cors_enabled {
        return CorsLayer::new();
    }

    if server_config.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// OpenAPI document handler.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Root endpoint handler.
async fn root() -> &'static str {
    "Product Catalog API v1"
}
