//! MQTT store configuration.

use std::time::Duration;

use serde::Deserialize;

/// Connection settings for the MQTT-backed remote store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Prefix prepended to every store path to build its topic.
    pub base_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// How long a read waits for the broker, in seconds.
    pub request_timeout_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "feedbridge".to_string(),
            base_topic: "feedbridge".to_string(),
            keep_alive_secs: 30,
            request_timeout_secs: 5,
        }
    }
}

impl MqttConfig {
    /// Topic holding the value of store `path`.
    #[must_use]
    pub fn topic(&self, path: &str) -> String {
        let base = self.base_topic.trim_end_matches('/');
        if base.is_empty() {
            path.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.request_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "feedbridge");
        assert_eq!(config.base_topic, "feedbridge");
        assert_eq!(config.keep_alive(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "mqtt.example.com"
            broker_port = 8883
            client_id = "feeder-kitchen"
            base_topic = "home/feeder"
            keep_alive_secs = 60
            request_timeout_secs = 2
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "mqtt.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.client_id, "feeder-kitchen");
        assert_eq!(config.base_topic, "home/feeder");
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.request_timeout_secs, 2);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "feedbridge");
    }

    #[test]
    fn should_build_topic_from_base_and_path() {
        let mut config = MqttConfig::default();
        assert_eq!(config.topic("Boton"), "feedbridge/Boton");

        config.base_topic = "home/feeder/".to_string();
        assert_eq!(config.topic("schedules"), "home/feeder/schedules");

        config.base_topic = String::new();
        assert_eq!(config.topic("NivelComida"), "NivelComida");
    }
}
