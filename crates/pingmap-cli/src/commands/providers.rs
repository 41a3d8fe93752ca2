//! `pingmap providers`

use anyhow::Result;
use pingmap_core::{PipelineOverrides, ProviderRegistry};
use std::path::Path;

use crate::output::{self, OutputFormat};

/// List the built-in providers with their effective endpoints.
pub fn list_providers(format: OutputFormat, config_file: Option<&Path>) -> Result<()> {
    let config = super::layered_config(config_file, PipelineOverrides::default())?;
    let registry = ProviderRegistry::builtin().with_endpoints(&config.endpoints);
    output::print_providers(&registry, format)
}
