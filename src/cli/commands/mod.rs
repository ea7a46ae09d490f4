//! CLI command implementations

pub mod boot;
pub mod config;
pub mod detect;
pub mod images;
pub mod run;
pub mod watch;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch as signal_watch};
use tokio::task::JoinHandle;

use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::models::{AppEvent, BootOutcome};
use crate::services::{BootLauncher, PassOutcome};

/// Execute a CLI command
pub async fn execute_command(command: Commands, cli: &Cli) -> Result<()> {
    match command {
        Commands::Run => run::execute_run_command(cli).await,
        Commands::Boot { image } => boot::execute_boot_command(cli, image).await,
        Commands::Watch { image, interval } => {
            watch::execute_watch_command(cli, image, interval).await
        }
        Commands::Detect => detect::execute_detect_command(),
        Commands::Images { json } => images::execute_images_command(json),
        Commands::Config { action } => config::execute_config_command(cli, action),
    }
}

pub(crate) fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::load(cli.config.clone()).context("Failed to load settings")
}

/// Launcher for the helper named on the command line or in the settings
pub(crate) fn create_launcher(cli: &Cli, settings: &Settings) -> BootLauncher {
    let program = cli
        .helper
        .clone()
        .unwrap_or_else(|| settings.config().helper.program.clone());
    BootLauncher::new(program)
}

/// Receiver that turns `true` when the user presses Ctrl+C
pub(crate) fn cancel_on_ctrl_c() -> signal_watch::Receiver<bool> {
    let (tx, rx) = signal_watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted by user");
            let _ = tx.send(true);
        }
    });
    rx
}

/// Print control loop events as they arrive
pub(crate) fn spawn_event_printer() -> (mpsc::UnboundedSender<AppEvent>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AppEvent::DeviceDetected(variant) => {
                    println!("🔌 Raspberry Pi detected: {}", variant);
                }
                AppEvent::ImageSelected(path) => {
                    println!("📁 Using image folder: {}", path.display());
                }
                AppEvent::LaunchStarted {
                    image,
                    expected_steps,
                } => {
                    println!(
                        "🚀 Booting {} (about {} steps)...",
                        image.display(),
                        expected_steps
                    );
                }
                AppEvent::LaunchProgress { line, fraction } => {
                    println!("[{:>3}%] {}", (fraction * 100.0).round() as u32, line);
                }
                AppEvent::LaunchFinished(job) => match job.outcome {
                    BootOutcome::Success => println!(
                        "✅ Boot completed in {}ms",
                        job.duration_ms().unwrap_or_default()
                    ),
                    BootOutcome::Cancelled => println!("🛑 Boot cancelled"),
                    BootOutcome::Failure | BootOutcome::Pending => println!("❌ Boot failed"),
                },
                AppEvent::Error(message) => println!("❌ {}", message),
                AppEvent::Warning(message) => println!("⚠️  {}", message),
                AppEvent::Info(message) => println!("💡 {}", message),
                AppEvent::StateChanged(_) => {}
            }
        }
    });

    (tx, handle)
}

/// Turn the end of a pass into the command result
pub(crate) fn pass_result(outcome: PassOutcome) -> Result<()> {
    match outcome {
        PassOutcome::NoDevice | PassOutcome::Remembered => Ok(()),
        PassOutcome::Cancelled => {
            println!("🛑 Cancelled");
            Ok(())
        }
        PassOutcome::Failed => Err(anyhow::anyhow!("Booting the attached device failed")),
    }
}
