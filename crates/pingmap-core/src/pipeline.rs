//! One notification run, from eligibility check to debounce bookkeeping.
//!
//! ```text
//! Idle → DebounceCheck → Skipped
//!                      → Resolving → Submitting → Succeeded | Failed
//! ```
//!
//! `Resolving` passes straight through when no configured provider needs
//! the URL list. Nothing is retried.

use crate::config::{DeployContext, PipelineConfig};
use crate::debounce::{DebounceDecision, DebounceGate, DebounceStore, now_ms};
use crate::provider::{ProviderRegistry, SubmissionContext, UrlList};
use crate::sitemap::SitemapResolver;
use crate::submit::{AggregateResult, run_all};
use crate::{HttpTransport, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Not started
    Idle,
    /// Evaluating eligibility and the debounce gate
    DebounceCheck,
    /// Nothing submitted
    Skipped,
    /// Resolving the sitemap URL list
    Resolving,
    /// Submitting to providers
    Submitting,
    /// Every provider succeeded or was skipped
    Succeeded,
    /// At least one provider failed
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::DebounceCheck => "debounce_check",
            Self::Skipped => "skipped",
            Self::Resolving => "resolving",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a run submitted nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Dry run
    DryRun,
    /// Deploy context is not `production`
    NotProduction {
        /// Context that was supplied, if any
        context: Option<String>,
    },
    /// A submission happened within the ignore period
    Debounced {
        /// Previous submission time, epoch milliseconds
        last_submit_ms: i64,
        /// Seconds until the cooldown ends
        remaining_secs: u64,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry run"),
            Self::NotProduction { context: Some(c) } => {
                write!(f, "deploy context '{c}' is not production")
            },
            Self::NotProduction { context: None } => write!(f, "no deploy context set"),
            Self::Debounced { remaining_secs, .. } => write!(
                f,
                "last submission is within the ignore period ({remaining_secs}s remaining)"
            ),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Nothing was submitted
    Skipped {
        /// Why
        #[serde(flatten)]
        reason: SkipReason,
        /// Providers that would have been submitted to
        providers: Vec<String>,
    },
    /// No provider failed
    Succeeded(AggregateResult),
    /// At least one provider failed
    Failed(AggregateResult),
}

impl RunOutcome {
    /// Final run state
    pub const fn state(&self) -> RunState {
        match self {
            Self::Skipped { .. } => RunState::Skipped,
            Self::Succeeded(_) => RunState::Succeeded,
            Self::Failed(_) => RunState::Failed,
        }
    }

    /// Provider outcomes, when providers were contacted
    pub const fn aggregate(&self) -> Option<&AggregateResult> {
        match self {
            Self::Skipped { .. } => None,
            Self::Succeeded(agg) | Self::Failed(agg) => Some(agg),
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    info!(from = %state, to = %next, "Run state");
    *state = next;
}

/// Wires resolver, providers, orchestrator and debounce gate together.
pub struct Pipeline {
    config: PipelineConfig,
    deploy: DeployContext,
    registry: ProviderRegistry,
    transport: Arc<dyn HttpTransport>,
    resolver: SitemapResolver,
    gate: DebounceGate,
}

impl Pipeline {
    /// Build a pipeline over the built-in providers, with endpoint
    /// overrides from `config` applied.
    pub fn new(
        config: PipelineConfig,
        deploy: DeployContext,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn DebounceStore>,
    ) -> Self {
        let registry = ProviderRegistry::builtin().with_endpoints(&config.endpoints);
        let resolver =
            SitemapResolver::new(Arc::clone(&transport)).with_max_depth(config.max_depth);
        let gate = DebounceGate::new(store, config.ignore_period());
        Self {
            config,
            deploy,
            registry,
            transport,
            resolver,
            gate,
        }
    }

    /// Run once, using the current time.
    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_at(now_ms()).await
    }

    /// Run once as if the current time were `now_ms`.
    ///
    /// # Errors
    ///
    /// Fails before any network activity on invalid configuration. Provider
    /// failures are reported through [`RunOutcome::Failed`], not as `Err`.
    pub async fn run_at(&self, now_ms: i64) -> Result<RunOutcome> {
        let mut state = RunState::Idle;
        let providers = self.config.provider_names();

        transition(&mut state, RunState::DebounceCheck);
        if let Some(reason) = self.ineligible() {
            return Ok(Self::skip(reason, providers));
        }

        let sitemap_url = self.config.sitemap_url()?;
        let key_location = self.config.key_location()?;

        match self.gate.check(now_ms) {
            Ok(DebounceDecision::Skip {
                last_submit_ms,
                remaining,
            }) => {
                let reason = SkipReason::Debounced {
                    last_submit_ms,
                    remaining_secs: remaining.as_secs(),
                };
                return Ok(Self::skip(reason, providers));
            },
            Ok(DebounceDecision::Proceed | DebounceDecision::Disabled) => {},
            Err(e) => warn!(error = %e, "Failed to read debounce state; continuing"),
        }

        transition(&mut state, RunState::Resolving);
        let url_list = if self.needs_url_list(&providers) {
            match self
                .resolver
                .resolve(sitemap_url.as_str(), self.config.resolve_budget())
                .await
            {
                Ok(urls) => {
                    info!(urls = urls.len(), "Resolved sitemap URL list");
                    UrlList::Resolved(urls)
                },
                Err(e) => {
                    warn!(url = %sitemap_url, error = %e, "Sitemap resolution failed");
                    UrlList::Failed(e.to_string())
                },
            }
        } else {
            UrlList::NotRequested
        };

        transition(&mut state, RunState::Submitting);
        let context = SubmissionContext {
            sitemap_url,
            url_list,
            indexnow_key: self.config.indexnow_key.clone(),
            key_location,
            missing_key_is_warning: !self.config.has_explicit_providers(),
        };
        let aggregate =
            run_all(&self.registry, self.transport.as_ref(), &providers, &context).await;

        if aggregate.failed {
            transition(&mut state, RunState::Failed);
            return Ok(RunOutcome::Failed(aggregate));
        }

        if let Err(e) = self.gate.record_success(now_ms) {
            warn!(error = %e, "Failed to record submission time");
        }
        transition(&mut state, RunState::Succeeded);
        Ok(RunOutcome::Succeeded(aggregate))
    }

    fn ineligible(&self) -> Option<SkipReason> {
        if self.deploy.dry_run {
            return Some(SkipReason::DryRun);
        }
        if !self.deploy.is_production() {
            return Some(SkipReason::NotProduction {
                context: self.deploy.context.clone(),
            });
        }
        None
    }

    /// The URL list is only worth resolving when a batch provider is
    /// configured and has a key to submit with.
    fn needs_url_list(&self, providers: &[String]) -> bool {
        self.config.indexnow_key.is_some() && self.registry.any_requires_url_list(providers)
    }

    fn skip(reason: SkipReason, providers: Vec<String>) -> RunOutcome {
        info!(reason = %reason, providers = %providers.join(", "), "Skipping sitemap submission");
        RunOutcome::Skipped { reason, providers }
    }
}
