//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads `garagedoor.toml` from `$GARAGEDOOR_CONFIG_PATH` (a directory or the
//! file itself), falling back to the working directory. The file is
//! mandatory because the API key digests have no default. Environment
//! variables take precedence over file values.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use garagedoor_adapter_gpio::GpioConfig;
use garagedoor_adapter_mqtt::MqttConfig;
use garagedoor_app::controller::ControllerConfig;
use serde::Deserialize;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "garagedoor.toml";

/// Default `tracing` filter.
pub const DEFAULT_LOG_FILTER: &str = "garagedoord=info,garagedoor=info,tower_http=debug";

/// Top-level configuration. Every section is optional except `mode`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Which door adapter to drive.
    pub mode: Mode,
    /// bcrypt digests of the accepted API keys.
    #[serde(default)]
    pub api_keys: Vec<String>,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// GPIO pin assignment.
    #[serde(default)]
    pub gpio: GpioConfig,
    /// Controller timing.
    #[serde(default)]
    pub controller: ControllerSettings,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// MQTT bridge settings.
    #[serde(default)]
    pub mqtt: MqttConfig,
}

/// Adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// In-memory simulator.
    Development,
    /// Raspberry Pi GPIO.
    Production,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::Validation(format!("unknown mode `{other}`"))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Door controller timing, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerSettings {
    /// Interval between two sensor samples.
    pub poll_interval_ms: u64,
    /// Hold time of each edge of a toggle pulse.
    pub settle_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Locate and load the configuration file, then apply
    /// environment-variable overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path(std::env::var_os("GARAGEDOOR_CONFIG_PATH").map(PathBuf::from));
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ConfigError::Missing(path.to_path_buf()))
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides looked up by variable name.
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("GARAGEDOOR_MODE") {
            self.mode = val.parse()?;
        }
        if let Some(val) = lookup("GARAGEDOOR_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("GARAGEDOOR_PORT") {
            self.server.port = parse_port("GARAGEDOOR_PORT", &val)?;
        }
        if let Some(val) = lookup("GARAGEDOOR_BIND") {
            let (host, port) = val
                .rsplit_once(':')
                .filter(|(host, _)| !host.is_empty())
                .ok_or_else(|| {
                    ConfigError::Validation(format!("GARAGEDOOR_BIND `{val}` is not host:port"))
                })?;
            self.server.port = parse_port("GARAGEDOOR_BIND", port)?;
            self.server.host = host.to_string();
        }
        if let Some(val) = lookup("GARAGEDOOR_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_keys.is_empty() {
            return Err(ConfigError::Validation(
                "at least one API key digest is required".to_string(),
            ));
        }
        if let Some(key) = self.api_keys.iter().find(|key| !key.starts_with("$2")) {
            return Err(ConfigError::Validation(format!(
                "API key `{}…` is not a bcrypt digest",
                key.chars().take(4).collect::<String>()
            )));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if !self.gpio.has_distinct_pins() {
            return Err(ConfigError::Validation(
                "toggle, open and closed pins must be distinct".to_string(),
            ));
        }
        if self.controller.poll_interval_ms == 0 || self.controller.settle_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "controller intervals must be non-zero".to_string(),
            ));
        }
        if self.mqtt.enabled {
            if self.mqtt.broker_host.is_empty() {
                return Err(ConfigError::Validation(
                    "mqtt.broker_host is required when MQTT is enabled".to_string(),
                ));
            }
            if self.mqtt.object_id.is_empty() || self.mqtt.discovery_prefix.is_empty() {
                return Err(ConfigError::Validation(
                    "mqtt.discovery_prefix and mqtt.object_id must be set".to_string(),
                ));
            }
            if self.mqtt.keep_alive_secs == 0 {
                return Err(ConfigError::Validation(
                    "mqtt.keep_alive_secs must be non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Controller timing derived from the `[controller]` section.
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            poll_interval: Duration::from_millis(self.controller.poll_interval_ms),
            settle_delay: Duration::from_millis(self.controller.settle_delay_ms),
            ..ControllerConfig::default()
        }
    }
}

fn parse_port(var: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{var} `{value}` is not a valid port")))
}

/// Resolve the configuration file from the optional `GARAGEDOOR_CONFIG_PATH`.
fn config_path(configured: Option<PathBuf>) -> PathBuf {
    match configured {
        Some(path) if path.extension().is_some_and(|ext| ext == "toml") => path,
        Some(dir) => dir.join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            settle_delay_ms: 250,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file at the resolved path.
    #[error("config file not found at {}", .0.display())]
    Missing(PathBuf),
    /// TOML parse failure, including unknown keys, unknown modes and a
    /// missing `mode`.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
