//! Command Line Interface module
//!
//! Argument parsing and the command implementations that wire the
//! services together.

pub mod args;
pub mod commands;

pub use args::*;

use anyhow::Result;

use crate::utils::logging;

/// Main CLI application runner
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init_cli_logging(cli.verbose, cli.quiet)?;

    let command = cli.command.clone().unwrap_or(Commands::Run);
    commands::execute_command(command, &cli).await
}
