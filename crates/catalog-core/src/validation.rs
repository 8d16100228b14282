//! Validation utilities.

use crate::{CatalogError, FieldError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `CatalogError` on failure.
    fn validate_request(&self) -> Result<(), CatalogError> {
        self.validate().map_err(validation_errors_to_catalog_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Converts `validator::ValidationErrors` to `CatalogError`.
#[must_use]
pub fn validation_errors_to_catalog_error(errors: ValidationErrors) -> CatalogError {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));

    let message = fields
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    CatalogError::Validation { message, fields }
}

/// Common validation functions.
pub mod rules {
    use std::borrow::Cow;
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank")
                .with_message(Cow::Borrowed("product name is required")));
        }
        Ok(())
    }

    /// Validates that a price is a finite number greater than zero.
    pub fn positive_price<T: std::borrow::Borrow<f64>>(value: T) -> Result<(), ValidationError> {
        let value = value.borrow();
        if !value.is_finite() || *value <= 0.0 {
            return Err(ValidationError::new("positive_price")
                .with_message(Cow::Borrowed("product price must be positive")));
        }
        Ok(())
    }

    /// Validates that no image reference is blank.
    pub fn image_refs(values: &[String]) -> Result<(), ValidationError> {
        if values.iter().any(|v| v.trim().is_empty()) {
            return Err(ValidationError::new("image_ref_blank")
                .with_message(Cow::Borrowed("image references must not be blank")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_positive_price() {
        assert!(positive_price(&0.01).is_ok());
        assert!(positive_price(&0.0).is_err());
        assert!(positive_price(&-3.0).is_err());
        assert!(positive_price(&f64::NAN).is_err());
        assert!(positive_price(&f64::INFINITY).is_err());
    }

    #[test]
    fn test_image_refs() {
        assert!(image_refs(&vec!["a.jpg".to_string()]).is_ok());
        assert!(image_refs(&vec![]).is_ok());
        assert!(image_refs(&vec!["a.jpg".to_string(), " ".to_string()]).is_err());
    }

    #[test]
    fn test_error_message_carried() {
        let err = positive_price(&0.0).unwrap_err();
        assert_eq!(err.message.unwrap(), "product price must be positive");
    }
}
