//! Configuration management for usbboot-launcher

pub mod app_config;
pub mod settings;

pub use app_config::*;
pub use settings::*;
