//! Request logging middleware.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Logs one line per request with its outcome and latency.
///
/// Server errors are logged at `warn`; the error body itself is logged by
/// the response mapping.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        warn!(method = %method, uri = %uri, status, duration_ms, "HTTP request failed");
    } else {
        info!(method = %method, uri = %uri, status, duration_ms, "HTTP request completed");
    }

    response
}
