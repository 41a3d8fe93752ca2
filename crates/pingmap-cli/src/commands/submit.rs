//! `pingmap submit`

use anyhow::Result;
use pingmap_core::{
    DebounceStore, DeployContext, Fetcher, FileDebounceStore, MemoryDebounceStore, Pipeline,
    PipelineOverrides, RunOutcome,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::cli::SubmitArgs;
use crate::error::CliError;
use crate::output;
use crate::utils::parsing::parse_endpoints;

impl SubmitArgs {
    fn overrides(&self) -> Result<PipelineOverrides, CliError> {
        let endpoints = parse_endpoints(&self.endpoints).map_err(CliError::usage)?;
        Ok(PipelineOverrides {
            providers: self.providers.clone(),
            base_url: self.base_url.clone(),
            sitemap_path: self.sitemap_path.clone(),
            ignore_period: self.ignore_period,
            indexnow_key: self.indexnow_key.clone(),
            key_location: self.key_location.clone(),
            resolve_timeout_ms: self.resolve_timeout_ms,
            request_timeout_ms: self.request_timeout_ms,
            max_depth: self.max_depth,
            accept_invalid_certs: self.strict_tls.then_some(false),
            endpoints: (!endpoints.is_empty()).then_some(endpoints),
        })
    }
}

/// Run the notification pipeline once.
pub async fn submit(args: SubmitArgs, config_file: Option<&Path>) -> Result<()> {
    let config = super::layered_config(config_file, args.overrides()?)?;
    debug!(
        base_url = ?config.base_url,
        sitemap_path = %config.sitemap_path,
        providers = ?config.provider_names(),
        ignore_period_secs = config.ignore_period_secs,
        "Resolved configuration"
    );

    let store: Arc<dyn DebounceStore> = match &args.state_dir {
        Some(dir) => file_store(FileDebounceStore::new(dir)),
        None if config.ignore_period_secs == 0 => Arc::new(MemoryDebounceStore::new()),
        None => file_store(FileDebounceStore::with_default_dir().map_err(CliError::core)?),
    };

    let transport = Fetcher::with_options(config.fetcher_options()).map_err(CliError::core)?;

    let deploy = DeployContext {
        context: args.context.clone(),
        dry_run: args.dry_run,
    };
    let pipeline = Pipeline::new(config, deploy, Arc::new(transport), store);
    let outcome = pipeline.run().await.map_err(CliError::core)?;

    output::print_run(&outcome, args.format)?;

    if let RunOutcome::Failed(aggregate) = outcome {
        aggregate.into_verdict().map_err(CliError::core)?;
    }
    Ok(())
}

fn file_store(store: FileDebounceStore) -> Arc<dyn DebounceStore> {
    debug!(dir = %store.dir().display(), "Using debounce state directory");
    Arc::new(store)
}
