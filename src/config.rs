//! # Configuration Management
//!
//! Centralized configuration for the secure channel layer.
//!
//! This module provides structured configuration for the handshake driver,
//! the transport boundary, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-variable overrides via `from_env()`

use crate::error::{ChannelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default ceiling on a single transport packet, matching common
/// message-oriented transport defaults.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 16 * 1024;

/// An RSA-2048 hello frame needs 261 bytes; anything smaller than this
/// cannot carry the handshake at all.
pub const MIN_PACKET_SIZE: usize = 512;

/// Main configuration structure containing all configurable settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ChannelConfig {
    /// Handshake-specific configuration
    #[serde(default)]
    pub handshake: HandshakeConfig,

    /// Transport boundary configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ChannelConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChannelError::ConfigError(format!("Failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ChannelError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables, starting from
    /// defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("SECURE_CHANNEL_HANDSHAKE_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.handshake.timeout = Duration::from_millis(val);
            }
        }

        if let Ok(size) = std::env::var("SECURE_CHANNEL_MAX_PACKET_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.transport.max_packet_size = val;
            }
        }

        if let Ok(level) = std::env::var("SECURE_CHANNEL_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Validate the configuration for common issues and misconfigurations.
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.handshake.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method.
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ChannelError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Handshake driver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandshakeConfig {
    /// How long a pending handshake may sit in `Init` or
    /// `WaitForClientConfirm` before `prune_stalled` reaps it.
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl HandshakeConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.timeout.as_millis() < 100 {
            errors.push("Handshake timeout too short (minimum: 100ms)".to_string());
        } else if self.timeout.as_secs() > 300 {
            errors.push("Handshake timeout too long (maximum: 300s)".to_string());
        }
        errors
    }
}

/// Transport boundary configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// The underlying transport's maximum packet size. The secure layer
    /// reserves framing and padding headroom out of this.
    pub max_packet_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_packet_size < MIN_PACKET_SIZE {
            errors.push(format!(
                "Max packet size too small: {} bytes (minimum: {MIN_PACKET_SIZE}, an RSA hello frame must fit)",
                self.max_packet_size
            ));
        } else if self.max_packet_size > 16 * 1024 * 1024 {
            errors.push(format!(
                "Max packet size too large: {} bytes (maximum: 16 MB)",
                self.max_packet_size
            ));
        }
        errors
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, or error.
    pub level: String,

    /// Whether to use JSON formatting for logs.
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !matches!(
            self.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            errors.push(format!("Invalid log level: {}", self.level));
        }
        errors
    }
}

/// Helper module for Duration serialization/deserialization as milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
