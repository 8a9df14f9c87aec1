//! Server configuration
//!
//! All settings come from environment variables (a `.env` file is loaded by
//! `main` first). Defaults suit a local run without Redis or TLS.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use memberhook_core::{RedisSettings, DEFAULT_CUSTOM_FIELD_ID};

const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;
const DEFAULT_LOG_MAX_FILES: usize = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Configuration errors, reported once at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// Certificate and private key for HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address (BIND_ADDRESS)
    pub bind_address: SocketAddr,
    /// Custom field holding the TradingView login (CUSTOM_FIELD_ID)
    pub custom_field_id: i64,
    /// Profile store; `None` disables persistence (REDIS_HOST unset)
    pub redis: Option<RedisSettings>,
    pub store_timeout_ms: u64,
    /// HTTPS when both TLS_CERT_PATH and TLS_KEY_PATH are set
    pub tls: Option<TlsPaths>,
    /// Also write rotated log files here (LOG_DIR)
    pub log_dir: Option<PathBuf>,
    /// Rotated log files kept (LOG_MAX_FILES)
    pub log_max_files: usize,
    pub log_json: bool,
    /// Log masked request and response bodies (LOG_PAYLOADS)
    pub log_payloads: bool,
    pub request_timeout_secs: u64,
    /// Largest accepted request body (MAX_BODY_BYTES)
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            custom_field_id: DEFAULT_CUSTOM_FIELD_ID,
            redis: None,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            tls: None,
            log_dir: None,
            log_max_files: DEFAULT_LOG_MAX_FILES,
            log_json: false,
            log_payloads: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any name → value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let redis = match var("REDIS_HOST") {
            Some(host) => Some(RedisSettings {
                host,
                port: parse_or(&var, "REDIS_PORT", DEFAULT_REDIS_PORT)?,
                username: var("REDIS_USERNAME"),
                password: var("REDIS_PASSWORD"),
                db: parse_or(&var, "REDIS_DB", 0)?,
            }),
            None => None,
        };

        let tls = match (var("TLS_CERT_PATH"), var("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let config = Self {
            bind_address: parse_or(&var, "BIND_ADDRESS", default_bind_address())?,
            custom_field_id: parse_or(&var, "CUSTOM_FIELD_ID", DEFAULT_CUSTOM_FIELD_ID)?,
            redis,
            store_timeout_ms: parse_or(&var, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?,
            tls,
            log_dir: var("LOG_DIR").map(PathBuf::from),
            log_max_files: parse_or(&var, "LOG_MAX_FILES", DEFAULT_LOG_MAX_FILES)?,
            log_json: parse_bool(&var, "LOG_JSON", false)?,
            log_payloads: parse_bool(&var, "LOG_PAYLOADS", true)?,
            request_timeout_secs: parse_or(
                &var,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            max_body_bytes: parse_or(&var, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::Zero("STORE_TIMEOUT_MS"));
        }
        if self.log_max_files == 0 {
            return Err(ConfigError::Zero("LOG_MAX_FILES"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("REQUEST_TIMEOUT_SECS"));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Zero("MAX_BODY_BYTES"));
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_bool<F>(var: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        None => Ok(default),
    }
}
