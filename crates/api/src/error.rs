//! API error type and its HTTP mapping
//!
//! Client errors, oversized bodies and timeouts carry a fixed message.
//! Everything else becomes a generic 500 whose detail only reaches the logs.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use memberhook_core::RelayError;
use serde_json::json;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid event type")]
    InvalidEventType,

    #[error("Required custom field not found")]
    MissingCustomField,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Request timed out")]
    Timeout,

    /// Detail is logged, never returned
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidEventType | ApiError::MissingCustomField => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(error: RelayError) -> Self {
        match error {
            RelayError::InvalidEventType => ApiError::InvalidEventType,
            RelayError::MissingCustomField => ApiError::MissingCustomField,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Webhook handler failed");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Maps errors raised by the tower layers around the router
pub async fn handle_layer_error(error: BoxError) -> ApiError {
    if error.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request exceeded the configured timeout");
        ApiError::Timeout
    } else {
        ApiError::Internal(format!("middleware error: {error}"))
    }
}

/// Response for a handler that panicked; used by `CatchPanicLayer`
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
