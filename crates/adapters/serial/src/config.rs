//! Serial port configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the meter's serial connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device node of the meter.
    pub path: String,
    pub baud_rate: u32,
    /// Silence longer than this restarts the read without error.
    pub read_timeout_secs: u64,
    /// Delay between attempts to open the port.
    pub open_retry_secs: u64,
    /// Delay before reopening after a read failure.
    pub reopen_delay_secs: u64,
}

impl SerialConfig {
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    #[must_use]
    pub fn open_retry(&self) -> Duration {
        Duration::from_secs(self.open_retry_secs)
    }

    #[must_use]
    pub fn reopen_delay(&self) -> Duration {
        Duration::from_secs(self.reopen_delay_secs)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyACM1".to_string(),
            baud_rate: 115_200,
            read_timeout_secs: 10,
            open_retry_secs: 10,
            reopen_delay_secs: 4,
        }
    }
}
