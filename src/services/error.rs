//! Service error taxonomy
//!
//! Every service returns [`ServiceError`]. The HTTP layer maps each variant
//! to a status code and the `{message, errors}` body.

use std::collections::BTreeMap;

use crate::policy::Denial;

/// Per-field validation messages, keyed by the camelCase field name
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input failed validation
    #[error("Bad Request")]
    Validation(FieldErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// The requested dates overlap an existing booking
    #[error("Sorry, this spot is already booked for the specified dates")]
    Conflict,

    /// The resource is in a state that forbids the change
    #[error("{0}")]
    State(String),

    /// A unique value (email, username, review per spot) is already taken
    #[error("{0}")]
    Duplicate(String, FieldErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Validation failure on a single field
    pub fn invalid(field: &str, reason: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), reason.to_string());
        Self::Validation(errors)
    }

    /// Field messages carried by the error, if any
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Validation(errors) | Self::Duplicate(_, errors) => Some(errors.clone()),
            Self::Conflict => Some(
                [
                    ("startDate", "Start date conflicts with an existing booking"),
                    ("endDate", "End date conflicts with an existing booking"),
                ]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ),
            _ => None,
        }
    }
}

impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotFound(_) => Self::NotFound(denial.to_string()),
            Denial::Forbidden => Self::Forbidden(denial.to_string()),
            Denial::Conflict(_) => Self::Conflict,
            Denial::PastBooking | Denial::AlreadyStarted | Denial::ImageLimitReached => {
                Self::State(denial.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denials_keep_their_messages() {
        let err: ServiceError = Denial::NotFound("Booking").into();
        assert!(matches!(&err, ServiceError::NotFound(m) if m == "Booking couldn't be found"));

        let err: ServiceError = Denial::AlreadyStarted.into();
        assert_eq!(err.to_string(), "Bookings that have been started can't be deleted");

        let err: ServiceError = Denial::ImageLimitReached.into();
        assert!(matches!(err, ServiceError::State(_)));
    }

    #[test]
    fn test_conflict_carries_both_date_fields() {
        let errors = ServiceError::Conflict.field_errors().unwrap();

        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("startDate"));
        assert!(errors.contains_key("endDate"));
    }

    #[test]
    fn test_invalid_builds_single_field() {
        let err = ServiceError::invalid("city", "City is required");

        assert_eq!(err.to_string(), "Bad Request");
        assert_eq!(err.field_errors().unwrap()["city"], "City is required");
    }
}
