//! Structured logging setup via tracing-subscriber.
//!
//! The `SECURE_CHANNEL_LOG` environment variable overrides the configured
//! level using the usual env-filter syntax.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber from a [`LoggingConfig`].
///
/// Calling this twice panics inside tracing-subscriber; call it once from
/// process startup, not from library code.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_env("SECURE_CHANNEL_LOG")
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json_format {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt().with_env_filter(filter).with_target(true).init();
    }
}

/// Initialize with defaults; convenient for examples and tools.
pub fn init_default() {
    init(&LoggingConfig::default());
}
