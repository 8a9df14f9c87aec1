//! Application state

use std::sync::Arc;

use memberhook_core::{ProfileStore, RedisStore, WebhookRelay};

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Webhook handling, with the profile store attached when configured
    pub relay: WebhookRelay,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// A Redis client that cannot be constructed leaves persistence off; the
    /// relay still answers webhooks.
    pub fn new(config: Config) -> Self {
        let mut relay = WebhookRelay::new(config.custom_field_id);

        if let Some(settings) = &config.redis {
            match RedisStore::new(settings) {
                Ok(store) => {
                    relay = relay.with_store(Arc::new(store), config.store_timeout());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Invalid Redis settings; profile persistence disabled");
                }
            }
        } else {
            tracing::info!("REDIS_HOST not set; profile persistence disabled");
        }

        Self {
            config: Arc::new(config),
            relay,
        }
    }

    /// State around an existing relay
    pub fn with_relay(config: Config, relay: WebhookRelay) -> Self {
        Self {
            config: Arc::new(config),
            relay,
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn ProfileStore>> {
        self.relay.store()
    }
}
