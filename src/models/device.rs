//! USB device sightings and the Raspberry Pi variants recognized from them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broadcom USB vendor id used by the Raspberry Pi boot ROM
pub const PI_USB_VENDOR_ID: u16 = 0x0a5c;
/// Product id reported by the BCM2708 boot ROM
pub const PI_USB_PRODUCT_BCM2708: u16 = 0x2763;
/// Product id reported by the BCM2709 boot ROM
pub const PI_USB_PRODUCT_BCM2709: u16 = 0x2764;

/// One attached USB device as seen during a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceSighting {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Whether the device exposes a serial number string descriptor.
    /// The boot ROM does not, so a device with one is an already booted Pi.
    pub has_serial: bool,
}

impl DeviceSighting {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            has_serial: false,
        }
    }

    pub fn with_serial(mut self) -> Self {
        self.has_serial = true;
        self
    }

    /// Variant this sighting identifies, if it is a Pi waiting for a boot image
    pub fn variant(&self) -> Option<DeviceVariant> {
        if self.vendor_id != PI_USB_VENDOR_ID || self.has_serial {
            return None;
        }
        DeviceVariant::from_product_id(self.product_id)
    }
}

impl fmt::Display for DeviceSighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Recognized Raspberry Pi boot ROM variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceVariant {
    Bcm2708,
    Bcm2709,
}

impl DeviceVariant {
    pub const ALL: [DeviceVariant; 2] = [DeviceVariant::Bcm2708, DeviceVariant::Bcm2709];

    pub fn from_product_id(product_id: u16) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.product_id() == product_id)
    }

    pub fn product_id(self) -> u16 {
        match self {
            DeviceVariant::Bcm2708 => PI_USB_PRODUCT_BCM2708,
            DeviceVariant::Bcm2709 => PI_USB_PRODUCT_BCM2709,
        }
    }

    pub fn chip_name(self) -> &'static str {
        match self {
            DeviceVariant::Bcm2708 => "BCM2708",
            DeviceVariant::Bcm2709 => "BCM2709",
        }
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.chip_name())
    }
}
