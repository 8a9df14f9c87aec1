//! Subscription webhooks

use axum::{extract::State, http::StatusCode, Json};
use memberhook_core::{SubscriptionRecord, WebhookKind};
use serde::Serialize;

use super::WebhookPayload;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub subscription: SubscriptionRecord,
    pub message: &'static str,
}

/// POST /api/subscription/create-update
pub async fn create_update_subscription(
    State(state): State<AppState>,
    WebhookPayload(payload): WebhookPayload,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let subscription = state
        .relay
        .project_subscription(&payload, WebhookKind::SubscriptionUpsert)?;
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse {
            subscription,
            message: "Subscription created / updated successfully",
        }),
    ))
}

/// POST /api/subscription/delete
pub async fn delete_subscription(
    State(state): State<AppState>,
    WebhookPayload(payload): WebhookPayload,
) -> ApiResult<Json<SubscriptionResponse>> {
    let subscription = state
        .relay
        .project_subscription(&payload, WebhookKind::SubscriptionDelete)?;
    Ok(Json(SubscriptionResponse {
        subscription,
        message: "Subscription deleted successfully",
    }))
}
