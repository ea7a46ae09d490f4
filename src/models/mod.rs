//! Data models and types used throughout usbboot-launcher

pub mod boot;
pub mod device;
pub mod events;
pub mod image;

// Re-export commonly used types
pub use boot::*;
pub use device::*;
pub use events::*;
pub use image::*;
