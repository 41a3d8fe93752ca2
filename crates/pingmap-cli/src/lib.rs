//! pingmap CLI - notify search engines that a sitemap changed.
//!
//! The binary in `main.rs` is a thin wrapper around [`run`]; command
//! implementations live in `commands`.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
pub mod error;
mod output;
mod utils;

use crate::utils::initialize_logging;
use cli::{Cli, Commands};

/// Execute the pingmap CLI with the current arguments and environment.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the sitemap cannot be
/// resolved for `resolve`, or any provider fails during `submit`.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(&cli)?;
    execute_command(cli).await
}

async fn execute_command(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Submit(args) => commands::submit(args, config).await,
        Commands::Resolve(args) => commands::resolve_sitemap(args, config).await,
        Commands::Providers { format } => commands::list_providers(format, config),
    }
}
