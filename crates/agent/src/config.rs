use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

use client::{GeocoderConfig, TrackingApiConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    /// Devices whose tracking loops start with the agent.
    #[serde(default)]
    pub device_ids: Vec<Uuid>,

    /// Recorded position trace (JSON lines) served by the replay source.
    #[serde(default)]
    pub replay_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Backend kind: "http" against a real tracking API, or "memory" for
    /// demo mode.
    #[serde(default = "default_backend_kind")]
    pub kind: String,

    /// Tracking API origin (required for the http backend).
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Connection settings for the HTTP tracking client.
    pub fn api_config(&self) -> TrackingApiConfig {
        TrackingApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_listen")]
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}

impl MetricsConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.listen.parse()
    }
}

// Default value functions
fn default_backend_kind() -> String {
    "http".to_string()
}
fn default_backend_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_metrics_listen() -> String {
    "0.0.0.0:9100".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with EDUTRACK__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("EDUTRACK").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate().map_err(config::ConfigError::Message)?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides, without relying
    /// on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [agent]
            device_ids = []

            [backend]
            kind = "memory"
            base_url = ""
            timeout_secs = 10

            [geocoder]
            enabled = false

            [logging]
            level = "info"
            format = "pretty"

            [metrics]
            enabled = false
            listen = "127.0.0.1:9100"
        "#;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            defaults,
            config::FileFormat::Toml,
        ));
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate().map_err(config::ConfigError::Message)?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), String> {
        match self.backend.kind.as_str() {
            "http" => {
                if self.backend.base_url.is_empty() {
                    return Err("backend.base_url is required for the http backend".to_string());
                }
            }
            "memory" => {}
            other => return Err(format!("unknown backend kind: {other}")),
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(format!("unknown logging format: {}", self.logging.format));
        }

        if self.metrics.enabled {
            self.metrics
                .socket_addr()
                .map_err(|e| format!("invalid metrics listen address: {e}"))?;
        }

        Ok(())
    }
}
