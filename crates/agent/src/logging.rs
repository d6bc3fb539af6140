//! Logging initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initializes tracing from the logging configuration.
///
/// A `RUST_LOG` environment filter takes precedence over the configured
/// level, so individual tracking loops can be turned up without touching
/// config files.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .init(),
        _ => registry
            .with(fmt::layer().pretty().with_target(true))
            .init(),
    }
}
