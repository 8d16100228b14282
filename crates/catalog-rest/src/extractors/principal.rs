//! Request principal extractor.

use crate::responses::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use catalog_core::{CatalogError, UserId};

/// The authenticated caller of a request.
///
/// Inserted into request extensions by the authentication middleware.
/// Extracting it fails with 401 when the request carried no valid
/// credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
}

impl Principal {
    /// Creates a principal for a user.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or_else(|| AppError(CatalogError::unauthorized("Authentication required")))
    }
}
