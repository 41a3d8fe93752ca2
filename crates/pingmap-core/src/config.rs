//! Pipeline configuration.
//!
//! Configuration is resolved in layers, later layers winning:
//!
//! 1. **Built-in defaults** ([`PipelineConfig::default`])
//! 2. **Config file**: a TOML document shaped like [`PipelineOverrides`]
//! 3. **Caller overrides**: CLI flags and environment variables, also
//!    expressed as [`PipelineOverrides`]
//!
//! Blank strings in an override layer count as "not set", so an empty
//! environment variable never clobbers a value from the config file.
//!
//! ## Example Configuration File
//!
//! ```toml
//! base_url = "https://example.com"
//! sitemap_path = "/sitemap_index.xml"
//! providers = ["google", "indexnow"]
//! ignore_period = 3600
//! indexnow_key = "3f1c0e6b2a"
//!
//! [endpoints]
//! indexnow = "https://indexnow.internal.example/indexnow"
//! ```

use crate::provider::BUILTIN_PROVIDERS;
use crate::sitemap::{DEFAULT_MAX_DEPTH, DEFAULT_RESOLVE_BUDGET};
use crate::{Error, FetcherOptions, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Sitemap path used when none is configured.
pub const DEFAULT_SITEMAP_PATH: &str = "/sitemap.xml";

/// Default per-request timeout for provider submissions, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Fully resolved configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    /// Providers to submit to, in submission order.
    ///
    /// `None` selects every built-in provider. Unknown names are kept and
    /// fail individually at submission time.
    pub providers: Option<Vec<String>>,
    /// Base URL of the deployed site.
    pub base_url: Option<String>,
    /// Sitemap path, resolved against `base_url`.
    pub sitemap_path: String,
    /// Cooldown between submissions, in seconds. 0 disables the debounce gate.
    pub ignore_period_secs: u64,
    /// IndexNow API key.
    pub indexnow_key: Option<String>,
    /// URL of the hosted IndexNow key file. Defaults to `<base>/<key>.txt`.
    pub key_location: Option<String>,
    /// Time budget for resolving the full sitemap tree, in milliseconds.
    pub resolve_timeout_ms: u64,
    /// Per-request timeout, in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum sitemap index nesting depth.
    pub max_depth: u8,
    /// Accept invalid TLS certificates when fetching sitemaps.
    pub accept_invalid_certs: bool,
    /// Endpoint overrides keyed by provider name.
    pub endpoints: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            providers: None,
            base_url: None,
            sitemap_path: DEFAULT_SITEMAP_PATH.to_string(),
            ignore_period_secs: 0,
            indexnow_key: None,
            key_location: None,
            resolve_timeout_ms: u64::try_from(DEFAULT_RESOLVE_BUDGET.as_millis())
                .unwrap_or(60_000),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_depth: DEFAULT_MAX_DEPTH,
            accept_invalid_certs: true,
            endpoints: BTreeMap::new(),
        }
    }
}

/// One layer of optional configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOverrides {
    /// Provider names; entries may themselves be comma-separated lists.
    pub providers: Option<Vec<String>>,
    /// Base URL of the deployed site.
    pub base_url: Option<String>,
    /// Sitemap path.
    pub sitemap_path: Option<String>,
    /// Cooldown in seconds.
    pub ignore_period: Option<u64>,
    /// IndexNow API key.
    pub indexnow_key: Option<String>,
    /// IndexNow key file location.
    pub key_location: Option<String>,
    /// Resolution budget in milliseconds.
    pub resolve_timeout_ms: Option<u64>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Maximum sitemap index depth.
    pub max_depth: Option<u8>,
    /// Accept invalid TLS certificates when fetching sitemaps.
    pub accept_invalid_certs: Option<bool>,
    /// Endpoint overrides keyed by provider name.
    pub endpoints: Option<BTreeMap<String, String>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PipelineOverrides {
    /// Load an override layer from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }
}

impl PipelineConfig {
    /// Build a configuration from defaults plus the given layers, in order.
    pub fn layered<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = PipelineOverrides>,
    {
        let mut config = Self::default();
        for layer in layers {
            config.apply(layer);
        }
        config
    }

    /// Apply one override layer on top of the current values.
    pub fn apply(&mut self, overrides: PipelineOverrides) {
        if let Some(providers) = overrides.providers {
            let normalized = normalize_providers(&providers);
            if !normalized.is_empty() {
                self.providers = Some(normalized);
            }
        }
        if let Some(base_url) = non_blank(overrides.base_url) {
            self.base_url = Some(base_url);
        }
        if let Some(path) = non_blank(overrides.sitemap_path) {
            self.sitemap_path = path;
        }
        if let Some(period) = overrides.ignore_period {
            self.ignore_period_secs = period;
        }
        if let Some(key) = non_blank(overrides.indexnow_key) {
            self.indexnow_key = Some(key);
        }
        if let Some(location) = non_blank(overrides.key_location) {
            self.key_location = Some(location);
        }
        if let Some(ms) = overrides.resolve_timeout_ms {
            self.resolve_timeout_ms = ms;
        }
        if let Some(ms) = overrides.request_timeout_ms {
            self.request_timeout_ms = ms;
        }
        if let Some(depth) = overrides.max_depth {
            self.max_depth = depth;
        }
        if let Some(accept) = overrides.accept_invalid_certs {
            self.accept_invalid_certs = accept;
        }
        if let Some(endpoints) = overrides.endpoints {
            for (name, endpoint) in endpoints {
                self.endpoints.insert(name.trim().to_lowercase(), endpoint);
            }
        }
    }

    /// Names of the providers this run submits to.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.clone().unwrap_or_else(|| {
            BUILTIN_PROVIDERS
                .iter()
                .map(|builtin| builtin.name.to_string())
                .collect()
        })
    }

    /// Whether the provider list was chosen explicitly rather than defaulted.
    pub const fn has_explicit_providers(&self) -> bool {
        self.providers.is_some()
    }

    /// Absolute sitemap URL: `sitemap_path` resolved against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no base URL is configured and
    /// [`Error::InvalidUrl`] when the combination does not form an absolute
    /// `http`/`https` URL.
    pub fn sitemap_url(&self) -> Result<Url> {
        let base = self.base_url()?;
        let url = base.join(&self.sitemap_path).map_err(|e| {
            Error::InvalidUrl(format!(
                "cannot resolve sitemap path '{}' against '{base}': {e}",
                self.sitemap_path
            ))
        })?;
        Ok(url)
    }

    /// IndexNow key location, defaulting to `<base>/<key>.txt`.
    pub fn key_location(&self) -> Result<Option<String>> {
        if let Some(location) = &self.key_location {
            let parsed = Url::parse(location)
                .map_err(|e| Error::InvalidUrl(format!("key location '{location}': {e}")))?;
            return Ok(Some(parsed.to_string()));
        }
        let Some(key) = &self.indexnow_key else {
            return Ok(None);
        };
        let url = self.base_url()?.join(&format!("/{key}.txt"))?;
        Ok(Some(url.to_string()))
    }

    /// Resolution budget as a `Duration`
    pub const fn resolve_budget(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    /// Per-request timeout as a `Duration`
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// HTTP client options derived from this configuration
    pub const fn fetcher_options(&self) -> FetcherOptions {
        FetcherOptions {
            request_timeout: self.request_timeout(),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }

    /// Cooldown as a `Duration`
    pub const fn ignore_period(&self) -> Duration {
        Duration::from_secs(self.ignore_period_secs)
    }

    fn base_url(&self) -> Result<Url> {
        let raw = self.base_url.as_deref().ok_or_else(|| {
            Error::Config("no base URL configured (use --base-url or set URL)".to_string())
        })?;
        let base =
            Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("base URL '{raw}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "base URL '{raw}' must use http or https"
            )));
        }
        Ok(base)
    }
}

/// Split comma-separated entries, trim, lowercase, and drop duplicates
/// while keeping the first occurrence.
pub fn normalize_providers(raw: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for name in raw.iter().flat_map(|entry| entry.split(',')) {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// Deployment facts supplied by the build system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployContext {
    /// Deploy context name; only `production` deployments are submitted.
    pub context: Option<String>,
    /// Local or dry run: nothing is submitted.
    pub dry_run: bool,
}

impl DeployContext {
    /// A production, non-dry-run context
    pub fn production() -> Self {
        Self {
            context: Some("production".to_string()),
            dry_run: false,
        }
    }

    /// Whether this deployment is a production deployment
    pub fn is_production(&self) -> bool {
        self.context
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case("production"))
    }
}
