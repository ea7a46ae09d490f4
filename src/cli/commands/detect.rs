use anyhow::{Context, Result};

use crate::services::DeviceWatcher;

pub fn execute_detect_command() -> Result<()> {
    let devices = DeviceWatcher::new()
        .recognized_devices()
        .context("Failed to list USB devices")?;

    if devices.is_empty() {
        println!("No Raspberry Pi in USB boot mode found");
        return Ok(());
    }

    for (sighting, variant) in devices {
        println!("🔌 {} ({})", variant, sighting);
    }
    Ok(())
}
