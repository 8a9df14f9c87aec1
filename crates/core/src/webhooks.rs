//! Membership webhook handling
//!
//! Turns member and subscription lifecycle events into the minimal records
//! returned to the platform, and mirrors profile records into the profile
//! store when one is configured.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, RelayResult, StoreError, StoreResult};
use crate::events::WebhookKind;
use crate::extract::{
    coerce_to_string, extract_custom_field, optional_field, required_field, truncate_to_date,
    DEFAULT_CUSTOM_FIELD_ID,
};
use crate::store::ProfileStore;

/// Default bound on a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Profile derived from a member webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub member_id: String,
    pub username: String,
    pub trading_view_login: Value,
}

/// Subscription derived from a subscription webhook.
///
/// Ids are passed through untouched and may be null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub member_id: Value,
    pub subscription_id: Value,
    pub activated_at: Option<String>,
    pub expires_at: Option<String>,
}

/// Stateless handler for membership webhooks
#[derive(Clone)]
pub struct WebhookRelay {
    custom_field_id: i64,
    store: Option<Arc<dyn ProfileStore>>,
    store_timeout: Duration,
}

impl Default for WebhookRelay {
    fn default() -> Self {
        Self::new(DEFAULT_CUSTOM_FIELD_ID)
    }
}

impl WebhookRelay {
    /// Relay without persistence
    pub fn new(custom_field_id: i64) -> Self {
        Self {
            custom_field_id,
            store: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Mirror profiles into `store`, giving up on any call after `timeout`
    pub fn with_store(mut self, store: Arc<dyn ProfileStore>, timeout: Duration) -> Self {
        self.store = Some(store);
        self.store_timeout = timeout;
        self
    }

    pub fn custom_field_id(&self) -> i64 {
        self.custom_field_id
    }

    pub fn store(&self) -> Option<&Arc<dyn ProfileStore>> {
        self.store.as_ref()
    }

    /// Handle `member.created` / `member.updated`.
    ///
    /// The configured custom field must be present; `member.id` and
    /// `member.username` are trusted to exist.
    pub async fn upsert_profile(&self, payload: &Value) -> RelayResult<ProfileRecord> {
        WebhookKind::ProfileUpsert.validate(payload)?;

        let trading_view_login = extract_custom_field(payload, self.custom_field_id)
            .cloned()
            .ok_or_else(|| {
                tracing::warn!(
                    custom_field_id = self.custom_field_id,
                    "Member webhook without the required custom field"
                );
                RelayError::MissingCustomField
            })?;

        let profile = ProfileRecord {
            member_id: coerce_to_string(required_field(payload, "member.id")?),
            username: coerce_to_string(required_field(payload, "member.username")?),
            trading_view_login,
        };

        self.persist_profile(&profile).await;

        tracing::info!(member_id = %profile.member_id, "Profile created / updated");
        Ok(profile)
    }

    /// Handle `member.deleted`, returning the deleted member id
    pub async fn delete_profile(&self, payload: &Value) -> RelayResult<String> {
        WebhookKind::ProfileDelete.validate(payload)?;

        let member_id = coerce_to_string(required_field(payload, "member.id")?);

        if let Some(store) = &self.store {
            if let Err(e) = self.bounded(store.delete(&member_id)).await {
                tracing::error!(
                    member_id = %member_id,
                    error = %e,
                    "Failed to remove profile from store; webhook still acknowledged"
                );
            }
        }

        tracing::info!(member_id = %member_id, "Profile deleted");
        Ok(member_id)
    }

    /// Handle subscription create, update and delete events.
    ///
    /// All three share one projection; `kind` only decides which events are
    /// accepted.
    pub fn project_subscription(
        &self,
        payload: &Value,
        kind: WebhookKind,
    ) -> RelayResult<SubscriptionRecord> {
        kind.validate(payload)?;

        let empty = Value::Null;
        let subscription = payload
            .get("subscription")
            .filter(|s| s.is_object())
            .unwrap_or(&empty);

        let date = |key: &str| {
            truncate_to_date(optional_field(subscription, key).and_then(Value::as_str))
        };

        let record = SubscriptionRecord {
            member_id: optional_field(subscription, "member_id")
                .cloned()
                .unwrap_or(Value::Null),
            subscription_id: optional_field(subscription, "id")
                .cloned()
                .unwrap_or(Value::Null),
            activated_at: date("activated_at"),
            expires_at: date("expires_at"),
        };

        tracing::info!(
            kind = ?kind,
            member_id = %record.member_id,
            subscription_id = %record.subscription_id,
            "Subscription webhook processed"
        );
        Ok(record)
    }

    async fn persist_profile(&self, profile: &ProfileRecord) {
        let Some(store) = &self.store else {
            return;
        };

        let value = match serde_json::to_string(profile) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(member_id = %profile.member_id, error = %e, "Failed to serialize profile");
                return;
            }
        };

        match self.bounded(store.put(&profile.member_id, &value)).await {
            Ok(()) => tracing::debug!(member_id = %profile.member_id, "Profile written to store"),
            Err(e) => tracing::error!(
                member_id = %profile.member_id,
                error = %e,
                "Failed to write profile to store; webhook still acknowledged"
            ),
        }
    }

    async fn bounded<F>(&self, operation: F) -> StoreResult<()>
    where
        F: Future<Output = StoreResult<()>>,
    {
        match tokio::time::timeout(self.store_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout.as_millis())),
        }
    }
}
