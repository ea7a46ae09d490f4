//! Logging initialization for usbboot-launcher

use anyhow::Result;
use env_logger::{Builder, Target};
use log::LevelFilter;

/// Log level for the `-v`/`-q` command line flags
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Initialize stderr logging for the CLI.
///
/// `RUST_LOG` still applies on top of the level chosen by the flags.
pub fn init_cli_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);

    Builder::new()
        .target(Target::Stderr)
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .format_module_path(false)
        .try_init()?;

    // Initialize panic logging
    #[cfg(debug_assertions)]
    log_panics::init();

    log::debug!("usbboot-launcher logging initialized with level: {:?}", level);
    Ok(())
}
