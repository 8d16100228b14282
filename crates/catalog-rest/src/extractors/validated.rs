//! Validated JSON extractor for automatic request validation.
//!
//! `ValidatedJson<T>` deserializes a JSON body and validates it with the
//! `validator` crate. Malformed JSON and validation failures are both
//! rejected with 400 and the catalog error body.

use crate::responses::AppError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use catalog_core::{CatalogError, ValidateExt};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor that validates the deserialized value.
///
/// # Example
///
/// ```ignore
/// async fn create_product(ValidatedJson(request): ValidatedJson<CreateProductRequest>) {
///     // request is guaranteed to be valid here
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Maps a JSON extraction failure to a bad request.
fn json_rejection(rejection: &JsonRejection) -> AppError {
    AppError(CatalogError::bad_request(format!(
        "Invalid JSON: {}",
        rejection.body_text()
    )))
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| json_rejection(&rejection))?;

        value.validate_request()?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct TestRequest {
        #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_request_passes() {
        let ValidatedJson(value) =
            ValidatedJson::<TestRequest>::from_request(json_request(r#"{"name":"Lamp"}"#), &())
                .await
                .unwrap();
        assert_eq!(value.name, "Lamp");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = ValidatedJson::<TestRequest>::from_request(json_request("{name"), &())
            .await
            .unwrap_err();
        assert!(matches!(err.0, CatalogError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_field_is_validation_error() {
        let err = ValidatedJson::<TestRequest>::from_request(json_request(r#"{"name":"ab"}"#), &())
            .await
            .unwrap_err();
        match err.0 {
            CatalogError::Validation { fields, .. } => {
                assert_eq!(fields[0].field, "name");
                assert_eq!(fields[0].message, "Name must be at least 3 characters");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
