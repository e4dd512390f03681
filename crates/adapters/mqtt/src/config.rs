//! MQTT bus configuration.

use serde::Deserialize;

/// Configuration for the MQTT bus connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub host: String,
    /// MQTT broker port.
    pub port: u16,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Inserted between `raw/<fqdn>` and the device name in data topics.
    pub subtopic: String,
    /// Overrides the detected fully-qualified host name used in topics.
    pub hostname: Option<String>,
    /// Overrides the `<app>_<pid>` client identifier.
    pub client_id: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            keep_alive_secs: 60,
            subtopic: "/".to_string(),
            hostname: None,
            client_id: None,
        }
    }
}
