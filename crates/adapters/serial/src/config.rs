//! Serial link configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings for opening the feeder's serial port.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
    /// Per-read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Wait after opening, while the board resets.
    pub settle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            settle_ms: 2000,
        }
    }
}

impl SerialConfig {
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
