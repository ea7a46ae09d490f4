use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::args::Cli;
use crate::services::{
    BootController, BootLauncher, DeviceWatcher, FixedImageSelector, ImageCatalog, ImageSelector,
    PassOutcome, PromptSelector, SettingsSelector,
};

use super::{cancel_on_ctrl_c, create_launcher, load_settings, pass_result, spawn_event_printer};

pub async fn execute_boot_command(cli: &Cli, image: Option<PathBuf>) -> Result<()> {
    println!("🔍 Looking for Raspberry Pi devices in USB boot mode...");

    let settings = load_settings(cli)?;
    let launcher = create_launcher(cli, &settings);

    match image {
        Some(image) => boot_attached(launcher, FixedImageSelector::new(image)).await,
        None => {
            let prompt = PromptSelector::stdio(ImageCatalog::discover());
            boot_attached(launcher, SettingsSelector::asking(settings, prompt)).await
        }
    }
}

async fn boot_attached<S: ImageSelector>(launcher: BootLauncher, selector: S) -> Result<()> {
    let (tx, printer) = spawn_event_printer();
    let mut controller = BootController::new(DeviceWatcher::new(), launcher, selector)
        .with_events(tx)
        .with_cancel(cancel_on_ctrl_c());

    let outcome = controller
        .run_interactive()
        .await
        .context("Boot pass failed")?;
    drop(controller);
    let _ = printer.await;

    match outcome {
        PassOutcome::NoDevice => println!("✅ No more devices waiting for a boot image"),
        PassOutcome::Remembered => println!("💾 Image remembered, use `watch` to boot the next devices"),
        _ => {}
    }
    pass_result(outcome)
}
