//! Utility functions and helpers used throughout usbboot-launcher

pub mod logging;
