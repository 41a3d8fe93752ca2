//! # pingmap-core
//!
//! Core library for pingmap: tell search engines a site's sitemap changed.
//!
//! After a production deployment, pingmap resolves the site's sitemap into a
//! flat list of page URLs and submits it to every configured indexing
//! provider concurrently, then reduces the per-provider outcomes to a single
//! pass/fail verdict.
//!
//! ## Architecture
//!
//! - **[`sitemap`]**: recursive sitemap resolution under one shared deadline
//! - **[`provider`]**: per-provider adapters (ping, IndexNow, deprecated)
//! - **[`submit`]**: concurrent fan-out and outcome aggregation
//! - **[`debounce`]**: cooldown guard backed by a key-value store
//! - **[`pipeline`]**: the per-run state machine wiring the above together
//! - **[`config`]**: layered configuration and deploy eligibility
//! - **[`fetcher`]**: the HTTP seam, with a `reqwest` implementation
//!
//! ## Quick Start
//!
//! ```no_run
//! use pingmap_core::{
//!     DeployContext, Fetcher, FileDebounceStore, Pipeline, PipelineConfig, PipelineOverrides,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> pingmap_core::Result<()> {
//! let config = PipelineConfig::layered([PipelineOverrides {
//!     base_url: Some("https://example.com".to_string()),
//!     providers: Some(vec!["google".to_string()]),
//!     ..PipelineOverrides::default()
//! }]);
//!
//! let pipeline = Pipeline::new(
//!     config,
//!     DeployContext::production(),
//!     Arc::new(Fetcher::new()?),
//!     Arc::new(FileDebounceStore::with_default_dir()?),
//! );
//! let outcome = pipeline.run().await?;
//! println!("{:?}", outcome.state());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`](Result) with [`Error`].
//! Provider failures are not errors at this level: they are reported as
//! [`SubmissionOutcome`]s and collapse into [`Error::ProvidersFailed`] only
//! through [`AggregateResult::into_verdict`].

/// Layered pipeline configuration and deploy eligibility
pub mod config;
/// Cooldown gate and its key-value stores
pub mod debounce;
/// Error types and result aliases
pub mod error;
/// HTTP transport seam and its `reqwest` implementation
pub mod fetcher;
/// Per-run state machine
pub mod pipeline;
/// Built-in providers and submission adapters
pub mod provider;
/// Sitemap parsing and recursive resolution
pub mod sitemap;
/// Concurrent submission to every configured provider
pub mod submit;

pub use config::{DeployContext, PipelineConfig, PipelineOverrides};
pub use debounce::{DebounceGate, DebounceStore, FileDebounceStore, MemoryDebounceStore};
pub use error::{Error, Result};
pub use fetcher::{Fetcher, FetcherOptions, HttpTransport};
pub use pipeline::{Pipeline, RunOutcome, RunState, SkipReason};
pub use provider::{
    OutcomeStatus, ProviderKind, ProviderRegistry, ProviderSpec, SubmissionContext,
    SubmissionOutcome,
};
pub use sitemap::{ResolvedUrlSet, SitemapDocument, SitemapResolver};
pub use submit::{AggregateResult, run_all};
