//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `powermunin.toml` in the working directory, or the file named by
//! `POWERMUNIN_CONFIG`. Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use powermunin_adapter_mqtt::MqttConfig;
use powermunin_adapter_serial::SerialConfig;

const DEFAULT_PATH: &str = "powermunin.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub mqtt: MqttConfig,
    pub serial: SerialConfig,
    pub publish: PublishConfig,
    pub devices: DevicesConfig,
}

/// Logging configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log at debug level instead of info.
    pub debug: bool,
    /// Write logs to this file instead of stderr.
    pub file: Option<PathBuf>,
    /// Filter directive (`RUST_LOG` syntax); wins over `debug`.
    pub filter: Option<String>,
}

/// Publishing cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Minimum seconds between two flushes to the bus.
    pub interval_secs: u64,
}

/// Device table location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    pub file: PathBuf,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("POWERMUNIN_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("POWERMUNIN_MQTT_HOST") {
            self.mqtt.host = val;
        }
        if let Some(port) = var("POWERMUNIN_MQTT_PORT").and_then(|val| val.parse().ok()) {
            self.mqtt.port = port;
        }
        if let Some(val) = var("POWERMUNIN_MQTT_SUBTOPIC") {
            self.mqtt.subtopic = val;
        }
        if let Some(val) = var("POWERMUNIN_HOSTNAME") {
            self.mqtt.hostname = Some(val);
        }
        if let Some(val) = var("POWERMUNIN_SERIAL_PATH") {
            self.serial.path = val;
        }
        if let Some(secs) = var("POWERMUNIN_PUBLISH_INTERVAL").and_then(|val| val.parse().ok()) {
            self.publish.interval_secs = secs;
        }
        if let Some(val) = var("POWERMUNIN_DEVICES_FILE") {
            self.devices.file = PathBuf::from(val);
        }
        if let Some(val) = var("POWERMUNIN_DEBUG") {
            self.logging.debug = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Some(val) = var("POWERMUNIN_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(val));
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = Some(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.port == 0 {
            return Err(ConfigError::Validation("mqtt port must be non-zero".to_string()));
        }
        if self.publish.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "publish interval must be non-zero".to_string(),
            ));
        }
        if self.serial.path.is_empty() {
            return Err(ConfigError::Validation("serial path must be set".to_string()));
        }
        if self.devices.file.as_os_str().is_empty() {
            return Err(ConfigError::Validation("devices file must be set".to_string()));
        }
        Ok(())
    }
}

impl LoggingConfig {
    /// The filter directive to install.
    #[must_use]
    pub fn directive(&self) -> &str {
        match &self.filter {
            Some(filter) => filter,
            None if self.debug => "debug",
            None => "info",
        }
    }
}

impl PublishConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("devices.csv"),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, val)| ((*key).to_string(), (*val).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.serial.path, "/dev/ttyACM1");
        assert_eq!(config.publish.interval(), Duration::from_secs(60));
        assert_eq!(config.devices.file, PathBuf::from("devices.csv"));
        assert!(!config.logging.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.mqtt.port, 1883);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [logging]
            debug = true
            file = '/var/log/powermunin.log'

            [mqtt]
            host = 'broker.lan'
            port = 1884
            subtopic = '/power/'

            [serial]
            path = '/dev/ttyUSB0'

            [publish]
            interval_secs = 30

            [devices]
            file = '/etc/powermunin/devices.csv'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.logging.debug);
        assert_eq!(
            config.logging.file,
            Some(PathBuf::from("/var/log/powermunin.log"))
        );
        assert_eq!(config.mqtt.host, "broker.lan");
        assert_eq!(config.mqtt.port, 1884);
        assert_eq!(config.mqtt.subtopic, "/power/");
        assert_eq!(config.serial.path, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.publish.interval_secs, 30);
        assert_eq!(
            config.devices.file,
            PathBuf::from("/etc/powermunin/devices.csv")
        );
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.publish.interval_secs, 60);
    }

    #[test]
    fn should_read_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("powermunin.toml");
        std::fs::write(&path, "[publish]\ninterval_secs = 5\n").unwrap();

        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.publish.interval_secs, 5);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("powermunin.toml");
        std::fs::write(&path, "invalid {{{").unwrap();

        let err = Config::from_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn should_apply_environment_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("POWERMUNIN_MQTT_HOST", "10.0.0.2"),
            ("POWERMUNIN_MQTT_PORT", "8883"),
            ("POWERMUNIN_PUBLISH_INTERVAL", "15"),
            ("POWERMUNIN_DEBUG", "true"),
            ("POWERMUNIN_HOSTNAME", "meter.lan"),
        ]));
        assert_eq!(config.mqtt.host, "10.0.0.2");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.publish.interval_secs, 15);
        assert!(config.logging.debug);
        assert_eq!(config.mqtt.hostname.as_deref(), Some("meter.lan"));
    }

    #[test]
    fn should_ignore_unparsable_numeric_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("POWERMUNIN_MQTT_PORT", "not-a-port")]));
        assert_eq!(config.mqtt.port, 1883);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.mqtt.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_interval() {
        let mut config = Config::default();
        config.publish.interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_empty_serial_path() {
        let mut config = Config::default();
        config.serial.path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_devices_file() {
        let mut config = Config::default();
        config.devices.file = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_pick_log_directive() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.directive(), "info");
        logging.debug = true;
        assert_eq!(logging.directive(), "debug");
        logging.filter = Some("powermunin=trace".to_string());
        assert_eq!(logging.directive(), "powermunin=trace");
    }
}
