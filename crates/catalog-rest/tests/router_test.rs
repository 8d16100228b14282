//! End-to-end router tests over in-memory backends.

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Request, StatusCode,
    },
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use catalog_config::{AuthConfig, ServerConfig};
use catalog_core::{CatalogError, Logger};
use catalog_jobs::InMemoryWorkQueue;
use catalog_repository::InMemoryProductRepository;
use catalog_rest::middleware::BasicAuthenticator;
use catalog_rest::{create_router, AppState};
use catalog_service::{InMemoryCache, MockProductService, ProductService, ProductServiceImpl};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

fn server_config(rate_limit_per_minute: u32) -> ServerConfig {
    ServerConfig {
        rate_limit_per_minute,
        ..ServerConfig::default()
    }
}

fn app_with(service: Arc<dyn ProductService>, config: &ServerConfig) -> Router {
    create_router(
        AppState::new(service),
        Arc::new(BasicAuthenticator::from_config(&AuthConfig::default())),
        config,
    )
}

fn in_memory_app(queue: Arc<InMemoryWorkQueue>) -> Router {
    let service = ProductServiceImpl::new(
        Arc::new(InMemoryProductRepository::new()),
        Arc::new(InMemoryCache::new()),
        queue,
        Logger::disabled(),
    );
    app_with(Arc::new(service), &server_config(0))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn create(body: &str) -> Request<Body> {
    Request::post("/api/v1/products")
        .header(CONTENT_TYPE, "application/json")
        .header(
            AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("admin:password")),
        )
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = in_memory_app(Arc::new(InMemoryWorkQueue::new("images")));

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app.clone().oneshot(get("/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ready");
}

#[tokio::test]
async fn test_ready_reports_store_failure() {
    let mut service = MockProductService::new();
    service
        .expect_health_check()
        .once()
        .return_once(|| Err(CatalogError::Database("connection refused".to_string())));

    let response = app_with(Arc::new(service), &server_config(0))
        .oneshot(get("/ready"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["status"], "not_ready");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let response = in_memory_app(Arc::new(InMemoryWorkQueue::new("images")))
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/products/{id}"].is_object());
}

#[tokio::test]
async fn test_create_get_list_flow() {
    let queue = Arc::new(InMemoryWorkQueue::new("images"));
    let app = in_memory_app(queue.clone());

    let response = app
        .clone()
        .oneshot(create(
            r#"{"product_name":"Blue Shirt","product_description":"Cotton","product_price":25.0,"product_images":["a.jpg","b.jpg"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["user_id"], 1);
    assert_eq!(queue.published(), 2);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/products/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, created);

    let response = app
        .clone()
        .oneshot(get("/api/v1/products?user_id=1&min_price=10&max_price=50&product_name=shirt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .oneshot(get("/api/v1/products?user_id=2"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_get_unknown_product_is_404() {
    let response = in_memory_app(Arc::new(InMemoryWorkQueue::new("images")))
        .oneshot(get("/api/v1/products/12345"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let service = ProductServiceImpl::new(
        Arc::new(InMemoryProductRepository::new()),
        Arc::new(InMemoryCache::new()),
        Arc::new(InMemoryWorkQueue::new("images")),
        Logger::disabled(),
    );
    let app = app_with(Arc::new(service), &server_config(2));

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/api/v1/products?user_id=1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/api/v1/products?user_id=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["code"], "RATE_LIMIT_EXCEEDED");

    // Health checks are outside the API budget.
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
