//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `feedbridge.toml` in the working directory, or the file named by
//! `FEEDBRIDGE_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use feedbridge_adapter_mqtt::MqttConfig;
use feedbridge_adapter_serial::SerialConfig;
use feedbridge_app::ports::StorePaths;
use feedbridge_domain::error::ValidationError;
use feedbridge_domain::level::{LevelScale, SensorSmoother};

const DEFAULT_CONFIG_PATH: &str = "feedbridge.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device link settings.
    pub device: DeviceConfig,
    /// Remote store settings.
    pub store: StoreConfig,
    /// Local schedule cache.
    pub cache: CacheConfig,
    /// Alarm and pulse timing.
    pub scheduler: SchedulerConfig,
    /// Food level conversion.
    pub level: LevelConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Which device link implementation to run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBackend {
    #[default]
    Serial,
    Virtual,
}

/// Which remote store implementation to run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Mqtt,
    Virtual,
}

/// Device link configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub backend: DeviceBackend,
    /// Port settings used by the serial backend.
    #[serde(flatten)]
    pub serial: SerialConfig,
    /// Delay between two polls of an idle link, in milliseconds.
    pub poll_interval_ms: u64,
}

/// Remote store configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Boolean actuator state.
    pub actuator_path: String,
    /// Mapping of schedule id to time of day.
    pub schedules_path: String,
    /// Food level percentage.
    pub level_path: String,
    /// Broker settings used by the MQTT backend.
    pub mqtt: MqttConfig,
}

/// Schedule cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// File holding the last-known-good schedules.
    pub path: PathBuf,
}

/// Scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Delay between two schedule checks, in seconds.
    pub poll_interval_secs: u64,
    /// How long a pulse keeps the actuator engaged, in seconds.
    pub dwell_secs: u64,
    /// How long shutdown waits for running pulses, in seconds.
    pub shutdown_grace_secs: u64,
}

/// Level sensor configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Number of samples averaged into one reading.
    pub window: usize,
    /// Distance (cm) at which the hopper is full.
    pub full_distance: f64,
    /// Distance (cm) at which the hopper is empty.
    pub empty_distance: f64,
    /// Percentage reported for a full hopper.
    pub max_percent: u8,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("FEEDBRIDGE_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
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
        if let Some(val) = var("FEEDBRIDGE_SERIAL_PORT") {
            self.device.serial.port = val;
        }
        if let Some(baud_rate) = var("FEEDBRIDGE_BAUD_RATE").and_then(|v| v.parse().ok()) {
            self.device.serial.baud_rate = baud_rate;
        }
        if let Some(val) = var("FEEDBRIDGE_MQTT_HOST") {
            self.store.mqtt.broker_host = val;
        }
        if let Some(port) = var("FEEDBRIDGE_MQTT_PORT").and_then(|v| v.parse().ok()) {
            self.store.mqtt.broker_port = port;
        }
        if let Some(val) = var("FEEDBRIDGE_CACHE_PATH") {
            self.cache.path = PathBuf::from(val);
        }
        if let Some(val) = var("FEEDBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.device.serial.baud_rate == 0 {
            return invalid("baud rate must be non-zero");
        }
        if self.device.poll_interval_ms == 0 {
            return invalid("device poll interval must be non-zero");
        }
        if self.scheduler.poll_interval_secs == 0 {
            return invalid("scheduler poll interval must be non-zero");
        }
        self.smoother()
            .map_err(|err| ConfigError::Validation(format!("level: {err}")))?;

        let paths = [
            &self.store.actuator_path,
            &self.store.schedules_path,
            &self.store.level_path,
        ];
        if paths.iter().any(|p| p.trim().is_empty()) {
            return invalid("store paths must not be empty");
        }
        if paths[0] == paths[1] || paths[0] == paths[2] || paths[1] == paths[2] {
            return invalid("store paths must be distinct");
        }
        Ok(())
    }

    /// The three logical store paths.
    #[must_use]
    pub fn paths(&self) -> StorePaths {
        StorePaths {
            actuator: self.store.actuator_path.clone(),
            schedules: self.store.schedules_path.clone(),
            level: self.store.level_path.clone(),
        }
    }

    /// A fresh smoother for the configured window and scale.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty window or an inconsistent
    /// scale.
    pub fn smoother(&self) -> Result<SensorSmoother, ValidationError> {
        let scale = LevelScale::new(
            self.level.full_distance,
            self.level.empty_distance,
            self.level.max_percent,
        )?;
        SensorSmoother::new(scale, self.level.window)
    }

    #[must_use]
    pub fn device_poll_interval(&self) -> Duration {
        Duration::from_millis(self.device.poll_interval_ms)
    }

    #[must_use]
    pub fn scheduler_poll_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.poll_interval_secs)
    }

    #[must_use]
    pub fn dwell(&self) -> Duration {
        Duration::from_secs(self.scheduler.dwell_secs)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.scheduler.shutdown_grace_secs)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: DeviceBackend::default(),
            serial: SerialConfig::default(),
            poll_interval_ms: 50,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        let paths = StorePaths::default();
        Self {
            backend: StoreBackend::default(),
            actuator_path: paths.actuator,
            schedules_path: paths.schedules,
            level_path: paths.level,
            mqtt: MqttConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("schedules_cache.json"),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            dwell_secs: 6,
            shutdown_grace_secs: 10,
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        let scale = LevelScale::default();
        Self {
            window: SensorSmoother::DEFAULT_WINDOW,
            full_distance: scale.full_distance(),
            empty_distance: scale.empty_distance(),
            max_percent: scale.max_percent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,rumqttc=warn".to_string(),
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
