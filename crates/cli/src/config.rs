//! Configuration management for fsgate.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/fsgate/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("base_dir must not be empty")]
    EmptyBaseDir,

    #[error("history path must not be empty when history is enabled")]
    EmptyHistoryPath,

    #[error("max_entries must be between 1 and 100000, got {0}")]
    InvalidMaxEntries(usize),

    #[error("log level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `history.max_entries`.
const MAX_HISTORY_ENTRIES: usize = 100_000;

/// Main configuration structure for fsgate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// File gateway configuration.
    pub gateway: GatewayConfig,

    /// Command history configuration.
    pub history: HistoryConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// File gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Directory every file operation is confined to. Relative paths are
    /// resolved against the working directory.
    pub base_dir: PathBuf,
}

/// Command history configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Whether commands are recorded.
    pub enabled: bool,

    /// History file. A leading `~` is expanded to the home directory.
    pub path: String,

    /// Maximum number of entries kept.
    pub max_entries: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,

    /// Optional log file. Logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.fsgate_history".to_string(),
            max_entries: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fsgate")
        .join("config.toml")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - FSGATE_BASE_DIR: Override the base directory
    /// - FSGATE_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    /// - FSGATE_HISTORY_FILE: Override the history file path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FSGATE_BASE_DIR") {
            if !dir.is_empty() {
                tracing::info!("Overriding base_dir from environment: {}", dir);
                self.gateway.base_dir = PathBuf::from(dir);
            }
        }

        if let Ok(level) = std::env::var("FSGATE_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log level from environment: {}", level);
                self.logging.level = level;
            }
        }

        if let Ok(path) = std::env::var("FSGATE_HISTORY_FILE") {
            if !path.is_empty() {
                tracing::info!("Overriding history path from environment: {}", path);
                self.history.path = path;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBaseDir);
        }

        if self.history.enabled && self.history.path.trim().is_empty() {
            return Err(ConfigError::EmptyHistoryPath);
        }

        let max = self.history.max_entries;
        if !(1..=MAX_HISTORY_ENTRIES).contains(&max) {
            return Err(ConfigError::InvalidMaxEntries(max));
        }

        let level = self.logging.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}
