//! Tracing setup

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::Config;

const DEFAULT_FILTER: &str = "info,memberhook_api=debug,memberhook_core=debug";
const LOG_FILE_PREFIX: &str = "memberhook";

/// Install the global subscriber.
///
/// Logs go to stdout, plus daily-rotated JSON files under `LOG_DIR` when set.
/// The returned guard flushes the file writer and must outlive the server.
pub fn init(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(if config.log_json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    });

    let guard = match &config.log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .max_log_files(config.log_max_files)
                .build(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().json().with_ansi(false).with_writer(writer).boxed());
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    if let Some(dir) = &config.log_dir {
        tracing::info!(
            log_dir = %dir.display(),
            max_files = config.log_max_files,
            "Writing rotated log files"
        );
    }

    Ok(guard)
}
