//! Command implementations.

mod providers;
mod resolve;
mod submit;

pub use providers::list_providers;
pub use resolve::resolve_sitemap;
pub use submit::submit;

use crate::error::CliError;
use pingmap_core::{PipelineConfig, PipelineOverrides};
use std::path::Path;

/// Defaults, then the config file (if any), then `overrides`.
fn layered_config(
    config_file: Option<&Path>,
    overrides: PipelineOverrides,
) -> Result<PipelineConfig, CliError> {
    let mut layers = Vec::with_capacity(2);
    if let Some(path) = config_file {
        layers.push(PipelineOverrides::load(path)?);
    }
    layers.push(overrides);
    Ok(PipelineConfig::layered(layers))
}
