//! # Output Formatting
//!
//! - **Text**: one line per provider with a ✓ / ⚠ / ✗ marker
//! - **JSON**: a single pretty-printed document for scripts
//!
//! ```bash
//! pingmap submit --format json | jq '.outcomes[] | select(.status == "error")'
//! ```

mod json;
mod text;

use anyhow::Result;
use pingmap_core::{ProviderRegistry, ResolvedUrlSet, RunOutcome};
use std::io::{self, Write};

/// Output format options supported by the CLI
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// Single JSON document
    Json,
}

impl OutputFormat {
    /// Whether the output is meant for machines
    pub const fn is_machine(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Print a run result to stdout
pub fn print_run(outcome: &RunOutcome, format: OutputFormat) -> Result<()> {
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Text => text::write_run(&mut out, outcome)?,
        OutputFormat::Json => writeln!(out, "{}", json::run(outcome)?)?,
    }
    Ok(())
}

/// Print a resolved URL set to stdout
pub fn print_urls(sitemap: &str, urls: &ResolvedUrlSet, format: OutputFormat) -> Result<()> {
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Text => text::write_urls(&mut out, urls)?,
        OutputFormat::Json => writeln!(out, "{}", json::urls(sitemap, urls)?)?,
    }
    Ok(())
}

/// Print the provider registry to stdout
pub fn print_providers(registry: &ProviderRegistry, format: OutputFormat) -> Result<()> {
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Text => text::write_providers(&mut out, registry)?,
        OutputFormat::Json => writeln!(out, "{}", json::providers(registry)?)?,
    }
    Ok(())
}
