// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! memberhook API Library
//!
//! HTTP surface of the membership webhook relay.
//!
//! ## Features
//!
//! - **Webhook Routes**: profile and subscription create/update/delete
//! - **Health Checks**: liveness and store-aware readiness
//! - **Masked Payload Logging**: request and response bodies with PII hidden
//! - **Error Mapping**: client errors as 400, oversized bodies 413, timeouts 408,
//!   everything else a generic 500

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;


pub use config::{Config, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
