//! Persistent settings store backed by a TOML file

use std::fs;
use std::path::{Path, PathBuf};

use crate::APP_NAME;
use crate::config::AppConfig;
use crate::errors::{Result, UsbBootError};

/// Application configuration together with the file it is persisted to
#[derive(Debug, Clone)]
pub struct Settings {
    path: Option<PathBuf>,
    config: AppConfig,
}

impl Settings {
    /// Default settings location, `<config dir>/usbboot-launcher/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
    }

    /// Load settings from `path` (or the default location).
    /// A missing file yields the default configuration.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.or_else(Self::default_path);

        let config = match &path {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(path).map_err(|e| {
                    UsbBootError::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                let config: AppConfig = toml::from_str(&content)?;
                log::debug!("Loaded settings from {}", path.display());
                config
            }
            Some(path) => {
                log::debug!("No settings at {}, using defaults", path.display());
                AppConfig::default()
            }
            None => {
                log::warn!("Cannot determine configuration directory, settings will not persist");
                AppConfig::default()
            }
        };

        Ok(Self { path, config })
    }

    /// Settings that are never written to disk
    pub fn in_memory(config: AppConfig) -> Self {
        Self { path: None, config }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn always_use_image(&self) -> Option<&str> {
        self.config.always_use_image()
    }

    pub fn has_always_use_image(&self) -> bool {
        self.always_use_image().is_some()
    }

    /// Remember (or with `None`, forget) the image used for every device, and persist it
    pub fn set_always_use_image(&mut self, image: Option<&str>) -> Result<()> {
        self.config.always_use_image = image.map(str::to_string);
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.config)?;
        fs::write(path, content).map_err(|e| {
            UsbBootError::Config(format!("Failed to write {}: {}", path.display(), e))
        })?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }
}
