//! Relay error types

use thiserror::Error;

/// Errors produced while turning a webhook payload into a record.
///
/// Only the first two variants are the caller's fault. Everything else is
/// reported to the caller as a generic internal error.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid event type")]
    InvalidEventType,

    #[error("Required custom field not found")]
    MissingCustomField,

    /// A field the platform always sends was missing or null
    #[error("required field missing: {0}")]
    MissingField(&'static str),

    /// Body could not be read or is not JSON
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl RelayError {
    /// Whether the sender of the webhook caused this error
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidEventType | Self::MissingCustomField)
    }
}

/// Errors from the key-value store backing profile records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store operation timed out after {0} ms")]
    Timeout(u128),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type RelayResult<T> = Result<T, RelayError>;
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_render_fixed_messages() {
        assert_eq!(RelayError::InvalidEventType.to_string(), "Invalid event type");
        assert_eq!(
            RelayError::MissingCustomField.to_string(),
            "Required custom field not found"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(RelayError::InvalidEventType.is_client_error());
        assert!(RelayError::MissingCustomField.is_client_error());
        assert!(!RelayError::MissingField("member.id").is_client_error());
        assert!(!RelayError::InvalidPayload("x".into()).is_client_error());
    }

    #[test]
    fn test_store_timeout_message() {
        assert_eq!(
            StoreError::Timeout(2000).to_string(),
            "store operation timed out after 2000 ms"
        );
    }
}
