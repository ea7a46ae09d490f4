use anyhow::{Context, Result};

use crate::cli::args::Cli;
use crate::services::{
    BootController, DeviceWatcher, ImageCatalog, PassOutcome, PromptSelector, SettingsSelector,
};

use super::{cancel_on_ctrl_c, create_launcher, load_settings, pass_result, spawn_event_printer};

/// Ask for an image for the attached devices unless one is remembered, then
/// keep watching for new devices once an image has been remembered.
pub async fn execute_run_command(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let launcher = create_launcher(cli, &settings);
    let interval = settings.config().poll_interval();

    let (tx, printer) = spawn_event_printer();
    let prompt = PromptSelector::stdio(ImageCatalog::discover());
    let mut controller = BootController::new(
        DeviceWatcher::new(),
        launcher,
        SettingsSelector::new(settings, prompt),
    )
    .with_events(tx)
    .with_cancel(cancel_on_ctrl_c());

    let mut outcome = PassOutcome::NoDevice;
    if !controller.selector().settings().has_always_use_image() {
        println!("🔍 Looking for Raspberry Pi devices in USB boot mode...");
        outcome = controller
            .run_interactive()
            .await
            .context("Boot pass failed")?;
    }

    if outcome != PassOutcome::Cancelled && controller.selector().settings().has_always_use_image()
    {
        if let Some(image) = controller.selector().settings().always_use_image() {
            println!("👀 Watching for devices, booting {}", image);
        }
        println!("   Press Ctrl+C to stop");
        outcome = controller
            .run_watch(interval)
            .await
            .context("Watching for devices failed")?;
    }

    drop(controller);
    let _ = printer.await;
    pass_result(outcome)
}
