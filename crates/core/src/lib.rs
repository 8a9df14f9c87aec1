// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! memberhook core
//!
//! Everything the relay does with a webhook payload, independent of HTTP.
//!
//! ## Features
//!
//! - **PII Masking**: redacted copies of payloads for logging
//! - **Event Validation**: per-endpoint accepted `event` values
//! - **Field Extraction**: custom-field lookup, date truncation
//! - **Projection**: profile and subscription records
//! - **Profile Store**: best-effort Redis persistence keyed by member id

pub mod error;
pub mod events;
pub mod extract;
pub mod masking;
pub mod store;
pub mod webhooks;


// Error
pub use error::{RelayError, RelayResult, StoreError, StoreResult};

// Events
pub use events::{validate_event, WebhookKind};

// Extraction
pub use extract::{extract_custom_field, truncate_to_date, DEFAULT_CUSTOM_FIELD_ID};

// Masking
pub use masking::{mask, mask_body, Mask, PII_FIELDS};

// Store
pub use store::{ProfileStore, RedisSettings, RedisStore};

// Webhooks
pub use webhooks::{ProfileRecord, SubscriptionRecord, WebhookRelay, DEFAULT_STORE_TIMEOUT};
