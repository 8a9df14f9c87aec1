//! Liveness and readiness checks

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// `disabled`, `healthy` or `unhealthy`
    pub store: &'static str,
}

/// GET /health, GET /health/live
pub async fn health() -> &'static str {
    "OK"
}

/// GET /health/ready
///
/// Always 200: the relay keeps answering webhooks while the store is down,
/// so store health is reported, not enforced.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let store = match state.store() {
        None => "disabled",
        Some(store) => {
            match tokio::time::timeout(state.config.store_timeout(), store.ping()).await {
                Ok(Ok(())) => "healthy",
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Profile store ping failed");
                    "unhealthy"
                }
                Err(_) => {
                    tracing::warn!("Profile store ping timed out");
                    "unhealthy"
                }
            }
        }
    };

    Json(ReadyResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store,
    })
}
