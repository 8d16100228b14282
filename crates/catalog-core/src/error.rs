//! Unified error types for all layers of the catalog.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for the catalog.
///
/// Covers domain, infrastructure, and presentation failures. Each variant
/// maps to exactly one HTTP status through [`CatalogError::status_code`].
#[derive(Error, Debug)]
pub enum CatalogError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Malformed request input that is not a field validation failure
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict error (e.g., duplicate entry)
    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ Authentication Errors ============
    /// Missing or invalid request principal
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    // ============ Infrastructure Errors ============
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Redis/Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Message queue error
    #[error("Queue error: {0}")]
    Queue(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CatalogError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation { .. } | Self::BadRequest(_) => 400,
            Self::Conflict(_) => 409,
            Self::Unauthorized(_) => 401,
            Self::RateLimitExceeded => 429,
            Self::Database(_)
            | Self::Cache(_)
            | Self::Queue(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Queue(_) => "QUEUE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error without field details.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::BadRequest(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true for not-found errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this error is retriable.
    ///
    /// Only transient dependency failures qualify; the image processor uses
    /// this to decide between requeueing and rejecting a work item.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Cache(_) | Self::Queue(_))
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some("23505") {
                    return Self::Conflict(db_err.message().to_string());
                }
                Self::Database(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {err}"))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    /// Request trace ID for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Field-level validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates a new error response from a `CatalogError`.
    ///
    /// Validation field details are carried over.
    #[must_use]
    pub fn from_error(error: &CatalogError) -> Self {
        let details = match error {
            CatalogError::Validation { fields, .. } if !fields.is_empty() => Some(fields.clone()),
            _ => None,
        };

        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
            trace_id: None,
        }
    }

    /// Sets the trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&CatalogError> for ErrorResponse {
    fn from(error: &CatalogError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(CatalogError::not_found("Product", 1).status_code(), 404);
        assert_eq!(CatalogError::validation("price must be positive").status_code(), 400);
        assert_eq!(CatalogError::bad_request("invalid id").status_code(), 400);
        assert_eq!(CatalogError::unauthorized("missing principal").status_code(), 401);
        assert_eq!(CatalogError::Conflict("duplicate".to_string()).status_code(), 409);
        assert_eq!(CatalogError::RateLimitExceeded.status_code(), 429);
    }

    #[test]
    fn test_dependency_errors_are_server_errors() {
        assert_eq!(CatalogError::Database("db down".to_string()).status_code(), 500);
        assert_eq!(CatalogError::Cache("redis down".to_string()).status_code(), 500);
        assert_eq!(CatalogError::Queue("broker down".to_string()).status_code(), 500);
        assert_eq!(CatalogError::internal("oops").status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CatalogError::not_found("Product", 1).error_code(), "NOT_FOUND");
        assert_eq!(CatalogError::validation("bad").error_code(), "VALIDATION_ERROR");
        assert_eq!(CatalogError::bad_request("bad").error_code(), "BAD_REQUEST");
        assert_eq!(CatalogError::unauthorized("no").error_code(), "UNAUTHORIZED");
        assert_eq!(CatalogError::Queue("q".to_string()).error_code(), "QUEUE_ERROR");
        assert_eq!(CatalogError::internal("err").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_retriable_errors() {
        assert!(CatalogError::Database("connection lost".to_string()).is_retriable());
        assert!(CatalogError::Cache("timeout".to_string()).is_retriable());
        assert!(CatalogError::Queue("channel closed".to_string()).is_retriable());
        assert!(!CatalogError::not_found("Product", 1).is_retriable());
        assert!(!CatalogError::validation("bad input").is_retriable());
    }

    #[test]
    fn test_is_not_found() {
        assert!(CatalogError::not_found("Product", 7).is_not_found());
        assert!(!CatalogError::internal("x").is_not_found());
    }

    #[test]
    fn test_error_constructors() {
        let not_found = CatalogError::not_found("Product", "123");
        assert!(not_found.to_string().contains("Product"));
        assert!(not_found.to_string().contains("123"));

        let validation = CatalogError::validation("invalid field");
        assert!(validation.to_string().contains("invalid field"));
    }

    #[test]
    fn test_error_response_from_error() {
        let err = CatalogError::not_found("Product", 1);
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "NOT_FOUND");
        assert!(!response.message.is_empty());
        assert!(response.details.is_none());
        assert!(response.trace_id.is_none());
    }

    #[test]
    fn test_error_response_carries_validation_fields() {
        let err = CatalogError::Validation {
            message: "product_name: product name is required".to_string(),
            fields: vec![FieldError {
                field: "product_name".to_string(),
                message: "product name is required".to_string(),
                code: "not_blank".to_string(),
            }],
        };
        let response = ErrorResponse::from(&err);
        let details = response.details.expect("details");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "product_name");
    }

    #[test]
    fn test_error_response_with_trace_id() {
        let response = ErrorResponse::from_error(&CatalogError::not_found("Product", 1))
            .with_trace_id("trace-123");
        assert_eq!(response.trace_id, Some("trace-123".to_string()));
    }
}
