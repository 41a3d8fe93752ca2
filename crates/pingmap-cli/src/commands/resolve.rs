//! `pingmap resolve`

use anyhow::Result;
use pingmap_core::{Fetcher, PipelineOverrides, SitemapResolver};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::cli::ResolveArgs;
use crate::error::CliError;
use crate::output;

/// Resolve a sitemap and print its URLs.
pub async fn resolve_sitemap(args: ResolveArgs, config_file: Option<&Path>) -> Result<()> {
    let config = super::layered_config(
        config_file,
        PipelineOverrides {
            resolve_timeout_ms: args.timeout_ms,
            max_depth: args.max_depth,
            accept_invalid_certs: args.strict_tls.then_some(false),
            ..PipelineOverrides::default()
        },
    )?;

    let transport = Fetcher::with_options(config.fetcher_options()).map_err(CliError::core)?;
    let resolver = SitemapResolver::new(Arc::new(transport)).with_max_depth(config.max_depth);

    let urls = resolver
        .resolve(&args.url, config.resolve_budget())
        .await
        .map_err(CliError::core)?;
    info!(url = %args.url, count = urls.len(), "Resolved sitemap");

    output::print_urls(&args.url, &urls, args.format)
}
