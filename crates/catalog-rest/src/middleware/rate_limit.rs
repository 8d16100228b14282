//! Request rate limiting middleware.

use crate::responses::AppError;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use catalog_core::CatalogError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

/// Shared request budget for the API.
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl RateLimitState {
    /// Allows `requests` per minute. Returns `None` when limiting is off.
    #[must_use]
    pub fn per_minute(requests: u32) -> Option<Self> {
        let requests = NonZeroU32::new(requests)?;
        Some(Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(requests))),
        })
    }

    /// Takes one request from the budget.
    pub fn check(&self) -> Result<(), CatalogError> {
        self.limiter
            .check()
            .map_err(|_| CatalogError::RateLimitExceeded)
    }
}

impl std::fmt::Debug for RateLimitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitState").finish_non_exhaustive()
    }
}

/// Rejects requests beyond the budget with 429.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Err(e) = state.check() {
        warn!(method = %request.method(), uri = %request.uri(), "Rate limit exceeded");
        return AppError(e).into_response();
    }

    next.run(request).await
}
