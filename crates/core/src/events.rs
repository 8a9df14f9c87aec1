//! Webhook event discriminators
//!
//! Every endpoint accepts a fixed set of `event` values. Anything else,
//! including a payload with no `event` key, is rejected before any field
//! is read.

use serde_json::Value;

use crate::error::{RelayError, RelayResult};

pub const MEMBER_CREATED: &str = "member.created";
pub const MEMBER_UPDATED: &str = "member.updated";
pub const MEMBER_DELETED: &str = "member.deleted";
pub const SUBSCRIPTION_CREATED: &str = "subscription.created";
pub const SUBSCRIPTION_UPDATED: &str = "subscription.updated";
pub const SUBSCRIPTION_DELETED: &str = "subscription.deleted";

/// The operation a webhook endpoint performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    ProfileUpsert,
    ProfileDelete,
    SubscriptionUpsert,
    SubscriptionDelete,
}

impl WebhookKind {
    /// Event names this endpoint accepts
    pub fn accepted_events(&self) -> &'static [&'static str] {
        match self {
            WebhookKind::ProfileUpsert => &[MEMBER_CREATED, MEMBER_UPDATED],
            WebhookKind::ProfileDelete => &[MEMBER_DELETED],
            WebhookKind::SubscriptionUpsert => &[SUBSCRIPTION_CREATED, SUBSCRIPTION_UPDATED],
            WebhookKind::SubscriptionDelete => &[SUBSCRIPTION_DELETED],
        }
    }

    pub fn validate(&self, payload: &Value) -> RelayResult<()> {
        if validate_event(payload, self.accepted_events()) {
            Ok(())
        } else {
            tracing::warn!(
                kind = ?self,
                event = ?event_name(payload),
                "Rejected webhook with unexpected event type"
            );
            Err(RelayError::InvalidEventType)
        }
    }
}

/// The `event` discriminator, if present and a string
pub fn event_name(payload: &Value) -> Option<&str> {
    payload.get("event").and_then(Value::as_str)
}

/// True when `payload.event` is one of `expected_events`
pub fn validate_event(payload: &Value, expected_events: &[&str]) -> bool {
    event_name(payload).is_some_and(|event| expected_events.contains(&event))
}
