use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::args::{Cli, ConfigAction};
use crate::services::{ImageCatalog, validate_image_dir};

use super::load_settings;

pub fn execute_config_command(cli: &Cli, action: ConfigAction) -> Result<()> {
    let mut settings = load_settings(cli)?;

    match action {
        ConfigAction::Show => {
            match settings.path() {
                Some(path) => println!("# {}", path.display()),
                None => println!("# (settings are not persisted)"),
            }
            print!("{}", toml::to_string_pretty(settings.config())?);
        }
        ConfigAction::SetDefault { image } => {
            let path = ImageCatalog::discover()
                .find(&image)
                .map(|found| found.path.clone())
                .unwrap_or_else(|| PathBuf::from(&image));
            validate_image_dir(&path)?;

            let image = path.to_string_lossy();
            settings
                .set_always_use_image(Some(&image))
                .context("Failed to save settings")?;
            println!("✅ Next devices will be booted with {}", image);
        }
        ConfigAction::ClearDefault => {
            settings
                .set_always_use_image(None)
                .context("Failed to save settings")?;
            println!("✅ An image will be asked for each device");
        }
    }
    Ok(())
}
