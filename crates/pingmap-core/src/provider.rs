//! Search-engine providers and their submission adapters.
//!
//! Each provider is submitted to independently and always reports a
//! [`SubmissionOutcome`]. Adapters never return `Err`: transport failures,
//! non-success statuses and missing inputs all become error outcomes so the
//! orchestrator can keep going with the remaining providers.

use crate::sitemap::ResolvedUrlSet;
use crate::{Error, HttpTransport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, warn};
use url::Url;

/// How a provider is notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// GET request carrying the sitemap URL as the `sitemap` query parameter.
    Ping,
    /// IndexNow batch POST with the resolved URL list.
    #[serde(rename = "indexnow")]
    IndexNow,
    /// Endpoint no longer accepts submissions; always reported as a warning.
    Deprecated,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping => write!(f, "ping"),
            Self::IndexNow => write!(f, "indexnow"),
            Self::Deprecated => write!(f, "deprecated"),
        }
    }
}

/// Static description of a built-in provider.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinProvider {
    /// Provider name as used in configuration.
    pub name: &'static str,
    /// Request shape.
    pub kind: ProviderKind,
    /// Default endpoint, absent for deprecated providers.
    pub endpoint: Option<&'static str>,
    /// Explanation shown for deprecated providers.
    pub note: Option<&'static str>,
}

/// Providers known to pingmap, in default submission order.
pub const BUILTIN_PROVIDERS: &[BuiltinProvider] = &[
    BuiltinProvider {
        name: "google",
        kind: ProviderKind::Ping,
        endpoint: Some("https://www.google.com/ping"),
        note: None,
    },
    BuiltinProvider {
        name: "bing",
        kind: ProviderKind::Deprecated,
        endpoint: None,
        note: Some("Bing no longer accepts sitemap pings; use the indexnow provider instead"),
    },
    BuiltinProvider {
        name: "indexnow",
        kind: ProviderKind::IndexNow,
        endpoint: Some("https://api.indexnow.org/indexnow"),
        note: None,
    },
    BuiltinProvider {
        name: "yandex",
        kind: ProviderKind::IndexNow,
        endpoint: Some("https://yandex.com/indexnow"),
        note: None,
    },
];

/// A provider with its effective endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSpec {
    /// Provider name
    pub name: String,
    /// Request shape
    pub kind: ProviderKind,
    /// Effective endpoint, after overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Explanation for deprecated providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&BuiltinProvider> for ProviderSpec {
    fn from(builtin: &BuiltinProvider) -> Self {
        Self {
            name: builtin.name.to_string(),
            kind: builtin.kind,
            endpoint: builtin.endpoint.map(str::to_string),
            note: builtin.note.map(str::to_string),
        }
    }
}

impl ProviderSpec {
    /// Whether this provider needs the resolved sitemap URL list.
    pub fn requires_url_list(&self) -> bool {
        self.kind == ProviderKind::IndexNow
    }

    /// Human-readable list of the inputs this provider needs.
    pub const fn required_inputs(&self) -> &'static str {
        match self.kind {
            ProviderKind::Ping => "sitemap URL",
            ProviderKind::IndexNow => "URL list, IndexNow key, key location",
            ProviderKind::Deprecated => "none",
        }
    }

    /// Submit to this provider. Never fails; the result is in the outcome.
    pub async fn submit(
        &self,
        transport: &dyn HttpTransport,
        context: &SubmissionContext,
    ) -> SubmissionOutcome {
        match self.kind {
            ProviderKind::Deprecated => SubmissionOutcome::warning(
                &self.name,
                self.note
                    .clone()
                    .unwrap_or_else(|| "Provider is deprecated; skipped".to_string()),
            ),
            ProviderKind::Ping => self.ping(transport, context).await,
            ProviderKind::IndexNow => self.index_now(transport, context).await,
        }
    }

    fn endpoint_url(&self) -> Result<Url, SubmissionOutcome> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Err(SubmissionOutcome::error(
                &self.name,
                "Provider has no endpoint configured",
                None,
            ));
        };
        Url::parse(endpoint).map_err(|e| {
            SubmissionOutcome::error(
                &self.name,
                format!("Invalid endpoint '{endpoint}'"),
                Some(e.to_string()),
            )
        })
    }

    async fn ping(
        &self,
        transport: &dyn HttpTransport,
        context: &SubmissionContext,
    ) -> SubmissionOutcome {
        let mut url = match self.endpoint_url() {
            Ok(url) => url,
            Err(outcome) => return outcome,
        };
        url.query_pairs_mut()
            .append_pair("sitemap", context.sitemap_url.as_str());

        debug!(provider = %self.name, url = %url, "Pinging provider");
        match transport.get(&url).await {
            Ok(status) => {
                SubmissionOutcome::success(&self.name, format!("Sitemap submitted (HTTP {status})"))
            },
            Err(e) => failure(&self.name, &e),
        }
    }

    async fn index_now(
        &self,
        transport: &dyn HttpTransport,
        context: &SubmissionContext,
    ) -> SubmissionOutcome {
        let Some(key) = context.indexnow_key.as_deref() else {
            let message = "No IndexNow key configured";
            if context.missing_key_is_warning {
                return SubmissionOutcome::warning(&self.name, format!("{message}; skipped"));
            }
            let err = Error::MissingInput {
                provider: self.name.clone(),
                input: "an IndexNow key".to_string(),
            };
            return SubmissionOutcome::error(&self.name, message, Some(err.to_string()));
        };

        let urls = match &context.url_list {
            UrlList::Resolved(urls) => urls,
            UrlList::Failed(cause) => {
                return SubmissionOutcome::error(
                    &self.name,
                    "Sitemap URL list unavailable",
                    Some(cause.clone()),
                );
            },
            UrlList::NotRequested => {
                return SubmissionOutcome::error(
                    &self.name,
                    "Sitemap URL list was not resolved",
                    None,
                );
            },
        };
        if urls.is_empty() {
            return SubmissionOutcome::warning(&self.name, "Sitemap lists no URLs; nothing to submit");
        }

        let Some(host) = context.sitemap_url.host_str() else {
            return SubmissionOutcome::error(
                &self.name,
                "Sitemap URL has no host",
                Some(context.sitemap_url.to_string()),
            );
        };

        let endpoint = match self.endpoint_url() {
            Ok(url) => url,
            Err(outcome) => return outcome,
        };

        let payload = IndexNowPayload {
            host,
            key,
            key_location: context.key_location.as_deref(),
            url_list: urls.iter().collect(),
        };
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => return failure(&self.name, &Error::from(e)),
        };

        debug!(provider = %self.name, url = %endpoint, urls = urls.len(), "Submitting URL list");
        match transport.post_json(&endpoint, &body).await {
            Ok(status) => SubmissionOutcome::success(
                &self.name,
                format!("Submitted {} URLs (HTTP {status})", urls.len()),
            ),
            Err(e) => failure(&self.name, &e),
        }
    }
}

fn failure(provider: &str, err: &Error) -> SubmissionOutcome {
    if err.is_recoverable() {
        warn!(provider = %provider, error = %err, "Provider submission failed");
    } else {
        error!(provider = %provider, error = %err, "Provider rejected submission");
    }
    SubmissionOutcome::error(provider, "Submission failed", Some(err.to_string()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexNowPayload<'a> {
    host: &'a str,
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_location: Option<&'a str>,
    url_list: Vec<&'a str>,
}

/// The set of providers available to a run.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderSpec>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderRegistry {
    /// Registry of the built-in providers with their default endpoints
    pub fn builtin() -> Self {
        Self {
            providers: BUILTIN_PROVIDERS.iter().map(ProviderSpec::from).collect(),
        }
    }

    /// Replace endpoints for the named providers.
    ///
    /// Overrides for unknown providers are ignored with a warning.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: &BTreeMap<String, String>) -> Self {
        for (name, endpoint) in endpoints {
            match self.providers.iter_mut().find(|p| &p.name == name) {
                Some(spec) => spec.endpoint = Some(endpoint.clone()),
                None => warn!(provider = %name, "Ignoring endpoint override for unknown provider"),
            }
        }
        self
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Option<&ProviderSpec> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// All providers, in default order
    pub fn iter(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.providers.iter()
    }

    /// Whether any of the named providers needs the resolved URL list.
    pub fn any_requires_url_list<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names
            .iter()
            .filter_map(|name| self.get(name.as_ref()))
            .any(ProviderSpec::requires_url_list)
    }

    /// Submit to the named provider.
    ///
    /// Unknown names produce an error outcome naming the provider.
    pub async fn submit(
        &self,
        name: &str,
        transport: &dyn HttpTransport,
        context: &SubmissionContext,
    ) -> SubmissionOutcome {
        match self.get(name) {
            Some(spec) => spec.submit(transport, context).await,
            None => {
                let err = Error::InvalidProvider(name.to_string());
                warn!(provider = %name, "Unknown provider");
                SubmissionOutcome::error(name, err.to_string(), None)
            },
        }
    }
}

/// State of the resolved URL list handed to providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlList {
    /// No configured provider needed it, so it was never resolved.
    NotRequested,
    /// Resolution succeeded.
    Resolved(ResolvedUrlSet),
    /// Resolution failed with the given cause.
    Failed(String),
}

/// Inputs shared by every provider submission in a run.
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    /// Absolute sitemap URL
    pub sitemap_url: Url,
    /// Resolved URL list, for IndexNow providers
    pub url_list: UrlList,
    /// IndexNow API key
    pub indexnow_key: Option<String>,
    /// IndexNow key file location
    pub key_location: Option<String>,
    /// Report a missing IndexNow key as a warning instead of an error.
    ///
    /// Set when the provider list was defaulted rather than chosen.
    pub missing_key_is_warning: bool,
}

impl SubmissionContext {
    /// Context with only a sitemap URL
    pub const fn new(sitemap_url: Url) -> Self {
        Self {
            sitemap_url,
            url_list: UrlList::NotRequested,
            indexnow_key: None,
            key_location: None,
            missing_key_is_warning: false,
        }
    }
}

/// Classification of a single provider result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Submission accepted.
    Success,
    /// Deliberately skipped; not a failure.
    Warning,
    /// Submission failed.
    Error,
}

impl OutcomeStatus {
    /// Single-character marker for terminal output
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Error => "✗",
        }
    }
}

/// Result of submitting to one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    /// Provider name, as configured
    pub provider: String,
    /// Classification
    pub status: OutcomeStatus,
    /// Human-readable summary
    pub message: String,
    /// Underlying error, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SubmissionOutcome {
    /// Successful submission
    pub fn success(provider: &str, message: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            status: OutcomeStatus::Success,
            message: message.into(),
            detail: None,
        }
    }

    /// Skipped submission
    pub fn warning(provider: &str, message: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            status: OutcomeStatus::Warning,
            message: message.into(),
            detail: None,
        }
    }

    /// Failed submission
    pub fn error(provider: &str, message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            provider: provider.to_string(),
            status: OutcomeStatus::Error,
            message: message.into(),
            detail,
        }
    }

    /// Whether this outcome counts toward a failed run
    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }

    /// Failure cause: the detail when present, otherwise the message.
    pub fn cause(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.message)
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status.marker(), self.provider, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::Fetcher;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sitemap_url() -> Url {
        Url::parse("https://example.com/sitemap.xml").unwrap()
    }

    fn registry_for(server: &MockServer) -> ProviderRegistry {
        let endpoints: BTreeMap<String, String> = [
            ("google".to_string(), format!("{}/ping", server.uri())),
            ("indexnow".to_string(), format!("{}/indexnow", server.uri())),
        ]
        .into_iter()
        .collect();
        ProviderRegistry::builtin().with_endpoints(&endpoints)
    }

    fn indexnow_context(urls: &[&str]) -> SubmissionContext {
        SubmissionContext {
            url_list: UrlList::Resolved(urls.iter().map(|u| (*u).to_string()).collect()),
            indexnow_key: Some("abc123".to_string()),
            key_location: Some("https://example.com/abc123.txt".to_string()),
            ..SubmissionContext::new(sitemap_url())
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ProviderRegistry::builtin();
        let names: Vec<&str> = registry.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["google", "bing", "indexnow", "yandex"]);

        assert!(!registry.get("google").unwrap().requires_url_list());
        assert!(registry.get("yandex").unwrap().requires_url_list());
        assert_eq!(registry.get("bing").unwrap().kind, ProviderKind::Deprecated);
        assert!(registry.get("altavista").is_none());

        assert!(registry.any_requires_url_list(&["google", "indexnow"]));
        assert!(!registry.any_requires_url_list(&["google", "bing", "altavista"]));
    }

    #[test]
    fn test_endpoint_overrides() {
        let endpoints: BTreeMap<String, String> = [
            ("yandex".to_string(), "http://localhost:1/indexnow".to_string()),
            ("altavista".to_string(), "http://localhost:2/".to_string()),
        ]
        .into_iter()
        .collect();
        let registry = ProviderRegistry::builtin().with_endpoints(&endpoints);
        assert_eq!(
            registry.get("yandex").unwrap().endpoint.as_deref(),
            Some("http://localhost:1/indexnow")
        );
        assert!(registry.get("altavista").is_none());
    }

    #[test]
    fn test_outcome_display() {
        let ok = SubmissionOutcome::success("google", "Sitemap submitted (HTTP 200)");
        assert_eq!(ok.to_string(), "✓ google: Sitemap submitted (HTTP 200)");

        let failed = SubmissionOutcome::error("indexnow", "Submission failed", Some("HTTP 403".into()));
        assert_eq!(failed.to_string(), "✗ indexnow: Submission failed (HTTP 403)");
        assert_eq!(failed.cause(), "HTTP 403");

        let skipped = SubmissionOutcome::warning("bing", "deprecated");
        assert!(skipped.to_string().starts_with("⚠ bing"));
        assert_eq!(skipped.cause(), "deprecated");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = SubmissionOutcome::warning("bing", "deprecated");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({ "provider": "bing", "status": "warning", "message": "deprecated" })
        );
    }

    #[tokio::test]
    async fn test_ping_sends_sitemap_query() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(query_param("sitemap", "https://example.com/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new()?;
        let outcome = registry_for(&server)
            .submit("google", &fetcher, &SubmissionContext::new(sitemap_url()))
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Success, "{outcome}");
        Ok(())
    }

    #[tokio::test]
    async fn test_ping_non_success_is_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new()?;
        let outcome = registry_for(&server)
            .submit("google", &fetcher, &SubmissionContext::new(sitemap_url()))
            .await;
        assert!(outcome.is_error());
        assert!(outcome.cause().contains("404"), "{outcome}");
        Ok(())
    }

    #[tokio::test]
    async fn test_deprecated_provider_warns_without_request() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new()?;
        let outcome = registry_for(&server)
            .submit("bing", &fetcher, &SubmissionContext::new(sitemap_url()))
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Warning);
        assert!(outcome.message.contains("indexnow"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_provider_is_error() -> anyhow::Result<()> {
        let fetcher = Fetcher::new()?;
        let outcome = ProviderRegistry::builtin()
            .submit("altavista", &fetcher, &SubmissionContext::new(sitemap_url()))
            .await;
        assert!(outcome.is_error());
        assert_eq!(outcome.provider, "altavista");
        assert!(outcome.message.contains("altavista"));
        Ok(())
    }

    #[tokio::test]
    async fn test_indexnow_posts_payload() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexnow"))
            .and(body_json(json!({
                "host": "example.com",
                "key": "abc123",
                "keyLocation": "https://example.com/abc123.txt",
                "urlList": ["https://example.com/a", "https://example.com/b"],
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new()?;
        let context = indexnow_context(&["https://example.com/b", "https://example.com/a"]);
        let outcome = registry_for(&server).submit("indexnow", &fetcher, &context).await;
        assert_eq!(outcome.status, OutcomeStatus::Success, "{outcome}");
        assert!(outcome.message.contains("2 URLs"));
        Ok(())
    }

    #[tokio::test]
    async fn test_indexnow_missing_inputs() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let fetcher = Fetcher::new()?;
        let registry = registry_for(&server);

        let mut no_key = indexnow_context(&["https://example.com/a"]);
        no_key.indexnow_key = None;
        let outcome = registry.submit("indexnow", &fetcher, &no_key).await;
        assert!(outcome.is_error());
        assert!(outcome.cause().contains("IndexNow key"));

        no_key.missing_key_is_warning = true;
        let outcome = registry.submit("indexnow", &fetcher, &no_key).await;
        assert_eq!(outcome.status, OutcomeStatus::Warning);

        let mut failed = indexnow_context(&[]);
        failed.url_list = UrlList::Failed("Parse error: bad xml".to_string());
        let outcome = registry.submit("indexnow", &fetcher, &failed).await;
        assert!(outcome.is_error());
        assert_eq!(outcome.cause(), "Parse error: bad xml");

        let empty = indexnow_context(&[]);
        let outcome = registry.submit("indexnow", &fetcher, &empty).await;
        assert_eq!(outcome.status, OutcomeStatus::Warning);
        Ok(())
    }
}
