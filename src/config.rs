//! # Configuration Management
//!
//! Centralized configuration for the codec: stream sizing, decode limits and
//! logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` or strings via `from_toml()`
//! - Environment variables (`NETBITS_*`) via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Example
//! ```toml
//! [stream]
//! reserve_bytes = 1200
//! max_read_bytes = 65536
//!
//! [logging]
//! app_name = "game-server"
//! log_level = "debug"
//! log_to_console = true
//! log_to_file = false
//! json_format = false
//! ```

use crate::core::buffer::INLINE_BYTES;
use crate::error::{constants, CodecError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

/// Typical MTU-safe datagram payload
pub const DEFAULT_RESERVE_BYTES: usize = INLINE_BYTES;

/// Default cap on length-prefixed byte blocks read from the wire (64 KB)
pub const DEFAULT_MAX_READ_BYTES: u32 = 64 * 1024;

/// Hard ceiling for `max_read_bytes` (16 MB)
pub const MAX_READ_BYTES_CEILING: u32 = 16 * 1024 * 1024;

/// Top-level codec configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct CodecConfig {
    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodecConfig {
    /// Read and parse a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CodecError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_OPEN)))?;
        Self::from_toml(&text)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| CodecError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_PARSE)))
    }

    /// Defaults overridden by `NETBITS_*` environment variables.
    ///
    /// Unparseable values are ignored and leave the default in place.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_vars(|key| std::env::var(key).ok()))
    }

    fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = var("NETBITS_RESERVE_BYTES").and_then(|v| v.parse().ok()) {
            config.stream.reserve_bytes = val;
        }

        if let Some(val) = var("NETBITS_MAX_READ_BYTES").and_then(|v| v.parse().ok()) {
            config.stream.max_read_bytes = val;
        }

        if let Some(level) = var("NETBITS_LOG_LEVEL").and_then(|v| v.parse::<Level>().ok()) {
            config.logging.log_level = level;
        }

        if let Some(path) = var("NETBITS_LOG_FILE") {
            config.logging.log_to_file = true;
            config.logging.log_file_path = Some(path);
        }

        if let Some(json) = var("NETBITS_LOG_JSON").and_then(|v| v.parse().ok()) {
            config.logging.json_format = json;
        }

        config
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CodecError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Every problem found, as human-readable messages; empty when valid
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.stream.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// [`CodecConfig::validate`] folded into a single `ConfigError`
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CodecError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Stream sizing and decode limits
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StreamConfig {
    /// Bytes reserved up front by `BitStream::from_config`; at or below the
    /// inline size no heap allocation happens
    pub reserve_bytes: usize,

    /// Largest length prefix accepted by `read_aligned_bytes_limited` on
    /// streams built with `BitStream::from_config`
    pub max_read_bytes: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reserve_bytes: DEFAULT_RESERVE_BYTES,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.reserve_bytes > MAX_READ_BYTES_CEILING as usize {
            errors.push(format!(
                "Stream reservation too large: {} bytes (maximum: 16 MB)",
                self.reserve_bytes
            ));
        }

        if self.max_read_bytes == 0 {
            errors.push("max_read_bytes must be greater than 0".to_string());
        } else if self.max_read_bytes > MAX_READ_BYTES_CEILING {
            errors.push(format!(
                "max_read_bytes too large: {} (maximum: 16 MB)",
                self.max_read_bytes
            ));
        }

        errors
    }
}

/// Where codec diagnostics go and how they look
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Reported in the startup event
    pub app_name: String,

    /// Default filter level; `RUST_LOG` overrides it
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    pub log_to_console: bool,

    /// Append to `log_file_path` instead of writing to stdout
    pub log_to_file: bool,

    pub log_file_path: Option<String>,

    /// One JSON object per event
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("netbits"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            match self.log_file_path.as_deref().map(Path::new) {
                None => errors.push("log_file_path must be specified when log_to_file is true".to_string()),
                Some(path) => {
                    let missing = path
                        .parent()
                        .filter(|dir| !dir.as_os_str().is_empty() && !dir.exists());
                    if let Some(dir) = missing {
                        errors.push(format!("Log file directory does not exist: {}", dir.display()));
                    }
                }
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// `tracing::Level` as a lowercase string in TOML
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse()
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {text}")))
    }
}
