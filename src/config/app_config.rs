//! Application configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Helper executed to push a boot image
pub const DEFAULT_HELPER_PROGRAM: &str = "rpiboot";

/// Seconds between USB polls in watch mode
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Image folder used for every device without asking. Empty means ask.
    pub always_use_image: Option<String>,
    /// Helper process configuration
    pub helper: HelperConfig,
    /// Watch mode configuration
    pub watch: WatchConfig,
}

/// Helper process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Program name or path, looked up in PATH
    pub program: String,
}

/// Watch mode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll interval in seconds
    pub poll_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            always_use_image: None,
            helper: HelperConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_HELPER_PROGRAM.to_string(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl AppConfig {
    /// Remembered image, ignoring an empty value
    pub fn always_use_image(&self) -> Option<&str> {
        self.always_use_image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.watch.poll_interval_secs.max(1))
    }
}
