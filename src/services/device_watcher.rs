//! USB device watcher for Raspberry Pi boot ROM devices
//!
//! The watcher answers one question: is a Pi waiting for a boot image attached
//! right now, and which variant is it? Each call takes a fresh snapshot of the
//! bus and releases it before returning.

use crate::errors::{Result, UsbBootError};
use crate::models::device::{DeviceSighting, DeviceVariant};

/// Source of USB device snapshots
pub trait UsbEnumerator: Send + Sync {
    /// Vendor/product ids of every attached device
    fn enumerate(&self) -> Result<Vec<DeviceSighting>>;
}

/// Enumerates the USB bus through `nusb`
#[derive(Debug, Clone, Copy, Default)]
pub struct NusbEnumerator;

impl UsbEnumerator for NusbEnumerator {
    fn enumerate(&self) -> Result<Vec<DeviceSighting>> {
        let devices = nusb::list_devices()
            .map_err(|e| UsbBootError::Device(format!("Failed to enumerate USB devices: {}", e)))?;

        Ok(devices
            .map(|device| DeviceSighting {
                vendor_id: device.vendor_id(),
                product_id: device.product_id(),
                has_serial: device.serial_number().is_some(),
            })
            .collect())
    }
}

/// First recognized variant in a device list
pub fn classify(sightings: &[DeviceSighting]) -> Option<DeviceVariant> {
    sightings.iter().find_map(DeviceSighting::variant)
}

/// Polls the USB bus for recognized devices
pub struct DeviceWatcher {
    enumerator: Box<dyn UsbEnumerator>,
}

impl DeviceWatcher {
    pub fn new() -> Self {
        Self::with_enumerator(NusbEnumerator)
    }

    pub fn with_enumerator(enumerator: impl UsbEnumerator + 'static) -> Self {
        Self {
            enumerator: Box::new(enumerator),
        }
    }

    /// Variant of the first recognized device, or `None`.
    ///
    /// Enumeration failures are logged and reported as "no device".
    pub fn detect_variant(&self) -> Option<DeviceVariant> {
        let sightings = match self.enumerator.enumerate() {
            Ok(sightings) => sightings,
            Err(e) => {
                log::warn!("{}", e);
                return None;
            }
        };

        let variant = classify(&sightings);
        match variant {
            Some(variant) => log::debug!(
                "Found {} among {} USB devices",
                variant,
                sightings.len()
            ),
            None => log::trace!("No Pi among {} USB devices", sightings.len()),
        }
        variant
    }

    /// All sightings that identify a recognized variant
    pub fn recognized_devices(&self) -> Result<Vec<(DeviceSighting, DeviceVariant)>> {
        Ok(self
            .enumerator
            .enumerate()?
            .into_iter()
            .filter_map(|sighting| sighting.variant().map(|variant| (sighting, variant)))
            .collect())
    }
}

impl Default for DeviceWatcher {
    fn default() -> Self {
        Self::new()
    }
}
