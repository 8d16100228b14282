//! Product controller.

use crate::{
    extractors::{Principal, ValidatedJson},
    responses::{created, ok, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalog_core::{CatalogError, ErrorResponse, Product, ProductId};
use catalog_service::{CreateProductRequest, ProductListQuery};
use std::time::Instant;
use tracing::{debug, info};

/// Creates the product router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product))
}

/// Create a product owned by the caller.
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Malformed or invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Persistence failure", body = ErrorResponse)
    ),
    security(("basic_auth" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let started = Instant::now();

    let product = state
        .product_service
        .create_product(principal.user_id, request)
        .await?;

    info!(
        product_id = %product.id,
        user_id = %principal.user_id,
        duration_ms = started.elapsed().as_millis() as u64,
        "Create product request completed"
    );
    Ok(created(product))
}

/// Get a product by ID.
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, description = "Non-numeric ID", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    let started = Instant::now();
    let product_id = parse_product_id(&id)?;

    let product = state.product_service.get_product(product_id).await?;

    debug!(
        product_id = %product_id,
        duration_ms = started.elapsed().as_millis() as u64,
        "Get product request completed"
    );
    ok(product)
}

/// List products matching a filter.
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Matching products", body = [Product]),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<Vec<Product>> {
    let started = Instant::now();
    let filter = query.into_filter();
    let user_id = filter.user_id;

    let products = state.product_service.list_products(filter).await?;

    debug!(
        user_id = %user_id,
        count = products.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "List products request completed"
    );
    ok(products)
}

/// Helper to parse a product ID from a path parameter.
fn parse_product_id(id: &str) -> Result<ProductId, AppError> {
    id.parse::<ProductId>()
        .map_err(|_| AppError(CatalogError::bad_request(format!("Invalid product ID: {id}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{basic_auth_middleware, AuthMiddlewareState, BasicAuthenticator};
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request},
        middleware,
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use catalog_config::AuthConfig;
    use catalog_core::{ProductFilter, UserId};
    use catalog_service::MockProductService;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn make_app(service: MockProductService) -> Router {
        let auth = AuthMiddlewareState::new(Arc::new(BasicAuthenticator::from_config(
            &AuthConfig::default(),
        )));
        Router::new()
            .nest("/products", router())
            .layer(middleware::from_fn_with_state(auth, basic_auth_middleware))
            .with_state(AppState::new(Arc::new(service)))
    }

    fn make_product(id: i64) -> Product {
        Product {
            id: ProductId(id),
            user_id: UserId(1),
            product_name: "Blue Shirt".to_string(),
            product_description: String::new(),
            product_images: vec!["a.jpg".to_string()],
            compressed_product_images: vec![],
            product_price: 20.0,
        }
    }

    fn basic(credentials: &str) -> String {
        format!("Basic {}", STANDARD.encode(credentials))
    }

    fn post(body: &str, credentials: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/products").header(CONTENT_TYPE, "application/json");
        if let Some(credentials) = credentials {
            builder = builder.header(AUTHORIZATION, basic(credentials));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_201() {
        let mut service = MockProductService::new();
        service
            .expect_create_product()
            .once()
            .withf(|owner, request| *owner == UserId(1) && request.product_name == "Blue Shirt")
            .return_once(|_, _| Ok(make_product(10)));
        service.expect_get_product().never();
        service.expect_list_products().never();

        let response = make_app(service)
            .oneshot(post(
                r#"{"product_name":"Blue Shirt","product_price":20.0,"product_images":["a.jpg"]}"#,
                Some("admin:password"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["id"], 10);
        assert_eq!(json["product_images"][0], "a.jpg");
    }

    #[tokio::test]
    async fn test_create_without_credentials_returns_401() {
        let mut service = MockProductService::new();
        service.expect_create_product().never();

        let response = make_app(service)
            .oneshot(post(r#"{"product_name":"Mug","product_price":3.0}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_create_with_wrong_password_returns_401() {
        let mut service = MockProductService::new();
        service.expect_create_product().never();

        let response = make_app(service)
            .oneshot(post(
                r#"{"product_name":"Mug","product_price":3.0}"#,
                Some("admin:nope"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_malformed_json_returns_400() {
        let mut service = MockProductService::new();
        service.expect_create_product().never();

        let response = make_app(service)
            .oneshot(post("{not json", Some("admin:password")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_create_invalid_price_returns_400() {
        let mut service = MockProductService::new();
        service.expect_create_product().never();

        let response = make_app(service)
            .oneshot(post(
                r#"{"product_name":"Mug","product_price":0}"#,
                Some("admin:password"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"][0]["field"], "product_price");
    }

    #[tokio::test]
    async fn test_create_store_failure_returns_500() {
        let mut service = MockProductService::new();
        service
            .expect_create_product()
            .once()
            .return_once(|_, _| Err(CatalogError::Database("connection refused".to_string())));

        let response = make_app(service)
            .oneshot(post(
                r#"{"product_name":"Mug","product_price":3.0}"#,
                Some("admin:password"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_get_returns_200() {
        let mut service = MockProductService::new();
        service
            .expect_get_product()
            .once()
            .withf(|id| *id == ProductId(7))
            .return_once(|_| Ok(make_product(7)));

        let response = make_app(service)
            .oneshot(Request::get("/products/7").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["product_name"], "Blue Shirt");
    }

    #[tokio::test]
    async fn test_get_non_numeric_id_returns_400() {
        let mut service = MockProductService::new();
        service.expect_get_product().never();

        let response = make_app(service)
            .oneshot(Request::get("/products/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_returns_404() {
        let mut service = MockProductService::new();
        service
            .expect_get_product()
            .once()
            .return_once(|id| Err(CatalogError::not_found("Product", id)));

        let response = make_app(service)
            .oneshot(Request::get("/products/99").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_forwards_filter() {
        let expected = ProductFilter::for_owner(UserId(1))
            .with_price_range(10.0, 50.0)
            .with_name("shirt");

        let mut service = MockProductService::new();
        service
            .expect_list_products()
            .once()
            .withf(move |filter| *filter == expected)
            .return_once(|_| Ok(vec![make_product(1), make_product(2)]));

        let response = make_app(service)
            .oneshot(
                Request::get("/products?user_id=1&min_price=10&max_price=50&product_name=shirt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_lenient_query_returns_empty_array() {
        let mut service = MockProductService::new();
        service
            .expect_list_products()
            .once()
            .withf(|filter| filter.user_id == UserId(0) && filter.min_bound().is_none())
            .return_once(|_| Ok(vec![]));

        let response = make_app(service)
            .oneshot(
                Request::get("/products?min_price=cheap")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }
}
