use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::args::Cli;
use crate::services::{
    BootController, BootLauncher, DeviceWatcher, FixedImageSelector, ImageCatalog, ImageSelector,
    PromptSelector, SettingsSelector,
};

use super::{cancel_on_ctrl_c, create_launcher, load_settings, pass_result, spawn_event_printer};

pub async fn execute_watch_command(
    cli: &Cli,
    image: Option<PathBuf>,
    interval: Option<u64>,
) -> Result<()> {
    let settings = load_settings(cli)?;
    let launcher = create_launcher(cli, &settings);
    let interval = interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| settings.config().poll_interval());

    match image {
        Some(image) => {
            println!("👀 Watching for devices, booting {}", image.display());
            watch_devices(launcher, FixedImageSelector::new(image), interval).await
        }
        None => {
            match settings.always_use_image() {
                Some(image) => println!("👀 Watching for devices, booting {}", image),
                None => println!("👀 Watching for devices, asking for an image each time"),
            }
            let prompt = PromptSelector::stdio(ImageCatalog::discover());
            watch_devices(launcher, SettingsSelector::new(settings, prompt), interval).await
        }
    }
}

pub(crate) async fn watch_devices<S: ImageSelector>(
    launcher: BootLauncher,
    selector: S,
    interval: Duration,
) -> Result<()> {
    println!("   Press Ctrl+C to stop");

    let (tx, printer) = spawn_event_printer();
    let mut controller = BootController::new(DeviceWatcher::new(), launcher, selector)
        .with_events(tx)
        .with_cancel(cancel_on_ctrl_c());

    let outcome = controller
        .run_watch(interval)
        .await
        .context("Watching for devices failed")?;
    drop(controller);
    let _ = printer.await;

    pass_result(outcome)
}
