//! Services implementing device detection, image selection and helper launching

pub mod boot_launcher;
pub mod controller;
pub mod device_watcher;
pub mod image_catalog;
pub mod image_selection;

pub use boot_launcher::*;
pub use controller::*;
pub use device_watcher::*;
pub use image_catalog::*;
pub use image_selection::*;
