//! Request validation utilities for consistent validation across handlers.

use crate::error::ApiError;

/// Trait for validating request payloads.
///
/// Implement this for every create/update request type so validation errors
/// carry consistent messages across the API.
pub trait RequestValidation {
    /// Validates the request and returns an error if validation fails
    fn validate(&self) -> Result<(), ApiError>;
}

/// Macro for validating fields with custom predicates
///
/// # Usage
///
/// ```ignore
/// validate_field!(self.quantity, self.quantity >= 1, "Quantity must be at least 1");
/// ```
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Macro for validating required fields (non-empty strings)
///
/// # Usage
///
/// ```ignore
/// validate_required!(self.delivery_address, "Delivery address is required");
/// ```
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Macro for validating string length
///
/// # Usage
///
/// ```ignore
/// validate_length!(self.subject, 1, 200, "Subject must be between 1 and 200 characters");
/// ```
#[macro_export]
macro_rules! validate_length {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        let len = $field.len();
        validate_field!($field, len >= $min && len <= $max, $message);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRequest {
        address: String,
        subject: String,
    }

    impl RequestValidation for TestRequest {
        fn validate(&self) -> Result<(), ApiError> {
            validate_required!(self.address, "Address is required");
            validate_length!(
                self.subject,
                1,
                200,
                "Subject must be between 1 and 200 characters"
            );
            Ok(())
        }
    }

    #[test]
    fn test_validation_success() {
        let request = TestRequest {
            address: "12 Harbour St".to_string(),
            subject: "Late delivery".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_address() {
        let request = TestRequest {
            address: "   ".to_string(),
            subject: "Late delivery".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validation_subject_too_long() {
        let request = TestRequest {
            address: "12 Harbour St".to_string(),
            subject: "x".repeat(201),
        };
        assert!(request.validate().is_err());
    }
}
