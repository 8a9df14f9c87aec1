//! Member profile webhooks

use axum::{extract::State, Json};
use memberhook_core::ProfileRecord;
use serde::Serialize;

use super::WebhookPayload;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: ProfileRecord,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProfileDeleted {
    pub message: String,
}

/// POST /api/profile/create-update
pub async fn create_update_profile(
    State(state): State<AppState>,
    WebhookPayload(payload): WebhookPayload,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state.relay.upsert_profile(&payload).await?;
    Ok(Json(ProfileResponse {
        profile,
        message: "Profile created / updated successfully",
    }))
}

/// POST /api/profile/delete
pub async fn delete_profile(
    State(state): State<AppState>,
    WebhookPayload(payload): WebhookPayload,
) -> ApiResult<Json<ProfileDeleted>> {
    let member_id = state.relay.delete_profile(&payload).await?;
    Ok(Json(ProfileDeleted {
        message: format!("Profile {member_id} deleted successfully"),
    }))
}
