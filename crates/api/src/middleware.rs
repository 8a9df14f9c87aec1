//! Request body limits and masked payload logging
//!
//! Bodies are buffered up to `MAX_BODY_BYTES`, logged with every PII field
//! masked, and handed on byte for byte. Only the log line is masked; the
//! payload never changes.

use std::error::Error;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use memberhook_core::mask_body;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Reject a declared `Content-Length` above the limit before reading any of
/// the body. Streamed bodies are capped by `RequestBodyLimitLayer`.
pub async fn reject_oversized_bodies(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    match declared {
        Some(length) if length > state.config.max_body_bytes as u64 => {
            tracing::warn!(
                content_length = length,
                max_body_bytes = state.config.max_body_bytes,
                uri = %request.uri(),
                "Rejected oversized request body"
            );
            ApiError::PayloadTooLarge.into_response()
        }
        _ => next.run(request).await,
    }
}

pub async fn log_masked_payloads(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.log_payloads {
        return next.run(request).await;
    }

    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let (parts, body) = request.into_parts();
    let bytes = match Limited::new(body, state.config.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if exceeds_length_limit(&*e) => {
            tracing::warn!(
                request_id = %request_id,
                max_body_bytes = state.config.max_body_bytes,
                "Request body exceeded the limit while streaming"
            );
            return ApiError::PayloadTooLarge.into_response();
        }
        Err(e) => {
            return ApiError::Internal(format!("failed to buffer request body: {e}"))
                .into_response()
        }
    };
    log_payload(&request_id, "request", &bytes);
    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Incoming webhook"
    );

    let response = next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return ApiError::Internal(format!("failed to buffer response body: {e}"))
                .into_response()
        }
    };
    log_payload(&request_id, "response", &bytes);
    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %parts.status,
        duration_ms = %start.elapsed().as_millis(),
        "Webhook answered"
    );

    Response::from_parts(parts, Body::from(bytes))
}

/// Whether `error` or anything it wraps is a body length limit
fn exceeds_length_limit(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

fn log_payload(request_id: &Uuid, direction: &'static str, bytes: &Bytes) {
    match mask_body(bytes) {
        Some(masked) => tracing::info!(
            request_id = %request_id,
            direction,
            payload = %masked,
            "Masked payload"
        ),
        None => tracing::debug!(
            request_id = %request_id,
            direction,
            bytes = bytes.len(),
            "Payload is empty or not JSON; not logged"
        ),
    }
}
