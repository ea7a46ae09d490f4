//! Error handling for usbboot-launcher

pub mod types;

pub use types::*;
