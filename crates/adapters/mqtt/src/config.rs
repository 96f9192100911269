//! MQTT bridge configuration.

use std::time::Duration;

use rumqttc::MqttOptions;
use serde::Deserialize;

use crate::topics::Topics;

/// Configuration for the MQTT bridge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MqttConfig {
    /// Whether the bridge is started at all.
    pub enabled: bool,
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier. Generated when empty.
    pub client_id: String,
    /// Optional broker credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Home Assistant discovery prefix, the root of every topic.
    pub discovery_prefix: String,
    /// Object id of the cover, also used as its unique id.
    pub object_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// How long to wait for the first sensor read after connecting, in seconds.
    pub ready_timeout_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: String::new(),
            username: None,
            password: None,
            discovery_prefix: "homeassistant".to_string(),
            object_id: "garagedoor".to_string(),
            keep_alive_secs: 30,
            ready_timeout_secs: 5,
        }
    }
}

impl MqttConfig {
    /// Topics of the configured cover.
    #[must_use]
    pub fn topics(&self) -> Topics {
        Topics::new(&self.discovery_prefix, &self.object_id)
    }

    /// Bound on the wait for the controller's first sensor read.
    #[must_use]
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs.into())
    }

    /// The configured client id, or `garagedoor-<random>` when unset.
    #[must_use]
    pub fn resolved_client_id(&self) -> String {
        if self.client_id.is_empty() {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            format!("garagedoor-{}", &suffix[..8])
        } else {
            self.client_id.clone()
        }
    }

    /// Connection options for rumqttc.
    #[must_use]
    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.resolved_client_id(),
            self.broker_host.clone(),
            self.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(self.keep_alive_secs.into()));
        if let Some(username) = &self.username {
            options.set_credentials(username.clone(), self.password.clone().unwrap_or_default());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.discovery_prefix, "homeassistant");
        assert_eq!(config.object_id, "garagedoor");
        assert_eq!(config.keep_alive_secs, 30);
        assert_eq!(config.ready_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            enabled = true
            broker_host = "mqtt.example.com"
            broker_port = 8883
            client_id = "garage"
            username = "door"
            password = "secret"
            discovery_prefix = "ha"
            object_id = "garage_door"
            keep_alive_secs = 60
            ready_timeout_secs = 10
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.broker_host, "mqtt.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.client_id, "garage");
        assert_eq!(config.username.as_deref(), Some("door"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.topics().action, "ha/cover/garage_door/action");
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.ready_timeout_secs, 10);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: MqttConfig = toml::from_str(r#"broker_host = "192.168.1.100""#).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert!(config.username.is_none());
    }

    #[test]
    fn should_reject_unknown_fields() {
        let result: Result<MqttConfig, _> = toml::from_str(r#"base_topic = "x""#);
        assert!(result.is_err());
    }

    #[test]
    fn should_keep_explicit_client_id() {
        let config = MqttConfig {
            client_id: "garage".to_string(),
            ..MqttConfig::default()
        };
        assert_eq!(config.resolved_client_id(), "garage");
    }

    #[test]
    fn should_generate_client_id_when_unset() {
        let config = MqttConfig::default();
        let first = config.resolved_client_id();
        assert!(first.starts_with("garagedoor-"));
        assert_eq!(first.len(), "garagedoor-".len() + 8);
        assert_ne!(first, config.resolved_client_id());
    }

    #[test]
    fn should_build_options_from_config() {
        let config = MqttConfig {
            broker_host: "broker".to_string(),
            broker_port: 1884,
            client_id: "garage".to_string(),
            keep_alive_secs: 45,
            ..MqttConfig::default()
        };
        let options = config.mqtt_options();
        assert_eq!(options.broker_address(), ("broker".to_string(), 1884));
        assert_eq!(options.client_id(), "garage");
        assert_eq!(options.keep_alive(), Duration::from_secs(45));
    }
}
