//! # Logging
//!
//! The codec itself only emits `tracing` events: `trace` for buffer growth
//! and range escapes, `debug` for heap spills and failed reads. This module
//! installs a `tracing-subscriber` formatter for binaries, tests and benches
//! that want to see them.
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use crate::config::LoggingConfig;
use crate::error::{CodecError, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()))
}

/// Install the global subscriber described by `config`.
///
/// Fails when a global subscriber is already installed or the log file
/// cannot be opened. File output wins over console output when both are
/// enabled.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match (config.log_to_file, &config.log_file_path) {
        (true, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CodecError::LoggingError(format!("Failed to open log file {path}: {e}")))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            if config.json_format {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        _ if config.json_format => builder.json().try_init(),
        _ => builder.try_init(),
    };

    installed.map_err(|e| CodecError::LoggingError(e.to_string()))?;
    tracing::info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(())
}

/// Quiet subscriber for tests: honours `RUST_LOG`, writes through the test
/// harness capture and ignores a subscriber that is already installed
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}
