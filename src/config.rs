use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_min_command_interval_ms() -> u64 {
    8
}

fn default_read_timeout_ms() -> i32 {
    100
}

fn default_max_consecutive_errors() -> u32 {
    25
}

fn default_led_pattern() -> u8 {
    0x01
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Minimum spacing between two commands written to the controller.
    #[serde(default = "default_min_command_interval_ms")]
    pub min_command_interval_ms: u64,
    /// Bound on every HID read. Must be non-zero.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: i32,
    /// Extra sleep between polls in the poll loop (0 = rely on command spacing only).
    #[serde(default)]
    pub poll_interval_ms: u64,
    /// Treat the baud-switch / second handshake / HID-only steps as fatal.
    #[serde(default)]
    pub strict_handshake: bool,
    /// Consecutive poll failures after which the poll loop gives the session up.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Player LED pattern sent during initialization.
    #[serde(default = "default_led_pattern")]
    pub led_pattern: u8,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            min_command_interval_ms: default_min_command_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            poll_interval_ms: 0,
            strict_handshake: false,
            max_consecutive_errors: default_max_consecutive_errors(),
            led_pattern: default_led_pattern(),
        }
    }
}

impl BridgeConfig {
    fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| BridgeError::Config("Cannot find config directory".into()))?
            .join("procon-bridge");
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join("config.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.read_timeout_ms <= 0 {
            return Err(BridgeError::Config(
                "read_timeout_ms must be positive; HID reads are always bounded".into(),
            ));
        }
        if self.max_consecutive_errors == 0 {
            return Err(BridgeError::Config(
                "max_consecutive_errors must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn min_command_interval(&self) -> Duration {
        Duration::from_millis(self.min_command_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
