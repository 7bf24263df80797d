//! Logging setup for the monitor binary.
//!
//! Library code only emits `tracing` events. The binary calls
//! [`init_logging`] once, which installs a console layer, a daily rolling
//! main log file and a dedicated alert file fed by the [`ALERT_TARGET`]
//! target.

use crate::config::LogConfig;
use crate::error::{MonitorError, Result};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Target used for trading alerts. Events on it also land in the alert file.
pub const ALERT_TARGET: &str = "alerts";

/// Flush guards for the non-blocking file writers. Keep alive until exit.
pub struct LogGuards {
    _main: WorkerGuard,
    _alerts: WorkerGuard,
}

/// Parse a level or directive string (`"info"`, `"meme_sentinel=debug"`).
pub fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| {
        MonitorError::configuration(format!("invalid log level '{}'", level))
            .with_context("field", "logging.level")
            .with_source(e)
    })
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LogConfig) -> Result<LogGuards> {
    fs::create_dir_all(&config.directory).map_err(|e| {
        MonitorError::configuration("cannot create log directory")
            .with_context("field", "logging.directory")
            .with_context("value", config.directory.clone())
            .with_source(e)
    })?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let (main_writer, main_guard) =
        tracing_appender::non_blocking(rolling::daily(&config.directory, &config.main_file_prefix));
    let (alert_writer, alert_guard) =
        tracing_appender::non_blocking(rolling::never(&config.directory, &config.alert_file));

    let console_layer = fmt::layer().with_target(true);
    let main_layer = fmt::layer().with_ansi(false).with_writer(main_writer);
    let alert_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(alert_writer)
        .with_filter(filter_fn(|meta| meta.target() == ALERT_TARGET));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(main_layer)
        .with(alert_layer)
        .try_init()
        .map_err(|e| {
            MonitorError::configuration("a global tracing subscriber is already installed")
                .with_source(e)
        })?;

    tracing::debug!(level = %config.level, directory = %config.directory, "Logging initialised");

    Ok(LogGuards {
        _main: main_guard,
        _alerts: alert_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_accepts_directives() {
        assert!(level_filter("info").is_ok());
        assert!(level_filter("meme_sentinel=debug,reqwest=warn").is_ok());
    }

    #[test]
    fn test_level_filter_rejects_garbage() {
        let err = level_filter("meme_sentinel=loud").unwrap_err();
        assert_eq!(err.context("field"), Some("logging.level"));
    }
}
