//! HTTP routes

mod health;
mod profile;
mod subscription;

use axum::{
    body::Bytes,
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, FromRequest, Request},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use memberhook_core::RelayError;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer};

use crate::{
    error::{handle_layer_error, panic_response, ApiError},
    middleware::{log_masked_payloads, reject_oversized_bodies},
    state::AppState,
};

pub use health::{health, ready};
pub use profile::{create_update_profile, delete_profile, ProfileDeleted, ProfileResponse};
pub use subscription::{create_update_subscription, delete_subscription, SubscriptionResponse};

/// Build the application router with its service layers
pub fn create_router(state: AppState) -> Router {
    let routes = Router::new()
        // Health
        .route("/health", get(health))
        .route("/health/live", get(health))
        .route("/health/ready", get(ready))
        // Member profiles
        .route("/api/profile/create-update", post(create_update_profile))
        .route("/api/profile/delete", post(delete_profile))
        // Subscriptions
        .route(
            "/api/subscription/create-update",
            post(create_update_subscription),
        )
        .route("/api/subscription/delete", post(delete_subscription));

    with_service_layers(routes, state)
}

/// Layers, outermost first: panic recovery, request timeout, body size
/// limit, masked payload logging
pub(crate) fn with_service_layers(routes: Router<AppState>, state: AppState) -> Router {
    let request_timeout = state.config.request_timeout();
    let max_body_bytes = state.config.max_body_bytes;
    routes
        .layer(from_fn_with_state(state.clone(), log_masked_payloads))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(from_fn_with_state(state.clone(), reject_oversized_bodies))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_layer_error))
                .timeout(request_timeout),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Raw webhook body parsed as JSON.
///
/// Content type is not checked. A body over the size limit is a 413; any
/// other unreadable or non-JSON body is an internal error.
#[derive(Debug)]
pub struct WebhookPayload(pub Value);

impl<S> FromRequest<S> for WebhookPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge
            } else {
                RelayError::InvalidPayload(e.body_text()).into()
            }
        })?;
        serde_json::from_slice(&bytes)
            .map(WebhookPayload)
            .map_err(|e| RelayError::InvalidPayload(e.to_string()).into())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::Config;
    use axum::http::StatusCode;
    use memberhook_core::WebhookRelay;
    use serde_json::json;

    fn app() -> Router {
        create_router(AppState::with_relay(Config::default(), WebhookRelay::default()))
    }

    #[tokio::test]
    async fn test_every_webhook_route_rejects_missing_event() {
        for uri in [
            "/api/profile/create-update",
            "/api/profile/delete",
            "/api/subscription/create-update",
            "/api/subscription/delete",
        ] {
            let (status, body) = post_json(app(), uri, &json!({"member": {"id": 1}})).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, json!({"error": "Invalid event type"}), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_every_webhook_route_rejects_foreign_event() {
        let cases = [
            ("/api/profile/create-update", "member.deleted"),
            ("/api/profile/delete", "member.created"),
            ("/api/subscription/create-update", "subscription.deleted"),
            ("/api/subscription/delete", "subscription.updated"),
        ];
        for (uri, event) in cases {
            let (status, body) = post_json(app(), uri, &json!({"event": event})).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, json!({"error": "Invalid event type"}), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_internal_error() {
        let response = post_raw(app(), "/api/profile/create-update", "not json").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Internal server error"})
        );
    }

    #[tokio::test]
    async fn test_panicking_handler_returns_generic_500() {
        let state = AppState::with_relay(Config::default(), WebhookRelay::default());
        async fn boom() -> &'static str {
            panic!("member 42 secret detail")
        }
        let routes: Router<AppState> = Router::new().route("/boom", post(boom));
        let app = with_service_layers(routes, state);

        let response = post_raw(app, "/boom", "{}").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Internal server error"})
        );
    }

    fn limited_app(log_payloads: bool) -> Router {
        let config = Config {
            max_body_bytes: 64,
            log_payloads,
            ..Config::default()
        };
        create_router(AppState::with_relay(config, WebhookRelay::default()))
    }

    fn oversized_payload() -> String {
        json!({"event": "member.deleted", "member": {"id": "x".repeat(256)}}).to_string()
    }

    #[tokio::test]
    async fn test_declared_oversized_body_rejected_before_reading() {
        // The declared length is never backed by a body; rejection must come
        // from the header alone.
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/profile/delete")
            .header("content-type", "application/json")
            .header("content-length", "3000000000")
            .body(axum::body::Body::from("{}"))
            .unwrap();
        let response = tower::ServiceExt::oneshot(limited_app(true), request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await, json!({"error": "Payload too large"}));
    }

    #[tokio::test]
    async fn test_streamed_oversized_body_is_413() {
        for log_payloads in [true, false] {
            let response =
                post_raw(limited_app(log_payloads), "/api/profile/delete", oversized_payload())
                    .await;
            assert_eq!(
                response.status(),
                StatusCode::PAYLOAD_TOO_LARGE,
                "log_payloads={log_payloads}"
            );
            assert_eq!(body_json(response).await, json!({"error": "Payload too large"}));
        }
    }

    #[tokio::test]
    async fn test_body_within_limit_is_accepted() {
        let (status, body) = post_json(
            limited_app(true),
            "/api/profile/delete",
            &json!({"event": "member.deleted", "member": {"id": 1}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Profile 1 deleted successfully"}));
    }

    #[tokio::test]
    async fn test_slow_handler_times_out_with_json_body() {
        async fn slow() -> &'static str {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            "late"
        }
        let config = Config {
            request_timeout_secs: 1,
            ..Config::default()
        };
        let state = AppState::with_relay(config, WebhookRelay::default());
        let app = with_service_layers(Router::new().route("/slow", post(slow)), state);

        let response = post_raw(app, "/slow", "{}").await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body_json(response).await, json!({"error": "Request timed out"}));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = post_raw(app(), "/api/unknown", "{}").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
