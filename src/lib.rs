//! usbboot-launcher - push boot images to Raspberry Pi devices waiting in USB boot mode
//!
//! The crate watches the USB bus for a Raspberry Pi (or Compute Module) that
//! exposes the BCM2708/BCM2709 boot ROM, resolves which boot image directory
//! should be pushed to it, and drives the external `rpiboot` helper while
//! reporting progress.

pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use errors::*;
pub use models::*;

/// usbboot-launcher version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name, also used for the configuration directory
pub const APP_NAME: &str = "usbboot-launcher";
