//! Command line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "usbboot-launcher")]
#[command(about = "Boot Raspberry Pi devices attached in USB boot mode with rpiboot")]
pub struct Cli {
    /// Settings file (defaults to <config dir>/usbboot-launcher/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Helper program to run instead of the configured one
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub helper: Option<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease logging verbosity (only errors)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// Ask for an image unless one is remembered, then keep watching for devices (default)
    Run,
    /// Boot every attached device once, asking which image to use
    Boot {
        /// Image folder to use instead of asking
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Keep polling for devices and boot each one as it appears
    Watch {
        /// Image folder to use instead of the remembered one
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Show which Raspberry Pi variant is attached
    Detect,
    /// List installed boot images
    Images {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the remembered image
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum ConfigAction {
    /// Print the current settings
    Show,
    /// Always use this image (catalog name or folder) for the next devices
    SetDefault { image: String },
    /// Ask each time a device is attached
    ClearDefault,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
