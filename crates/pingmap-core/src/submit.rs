//! Concurrent submission to every configured provider.

use crate::provider::{ProviderRegistry, SubmissionContext, SubmissionOutcome};
use crate::{Error, HttpTransport, Result};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, instrument};

/// Outcomes of one submission round, in configured provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    /// One outcome per configured provider
    pub outcomes: Vec<SubmissionOutcome>,
    /// True iff at least one outcome is an error
    pub failed: bool,
}

impl AggregateResult {
    /// Build an aggregate from outcomes, deriving `failed`.
    pub fn from_outcomes(outcomes: Vec<SubmissionOutcome>) -> Self {
        let failed = outcomes.iter().any(SubmissionOutcome::is_error);
        Self { outcomes, failed }
    }

    /// Number of error outcomes
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_error()).count()
    }

    /// Every failure cause, prefixed with its provider, in provider order.
    pub fn causes(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.is_error())
            .map(|o| format!("{}: {}", o.provider, o.cause()))
            .collect()
    }

    /// Cause of the first failure in provider order
    pub fn first_cause(&self) -> Option<String> {
        self.causes().into_iter().next()
    }

    /// Collapse into the run verdict.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProvidersFailed`] carrying the failure count and the
    /// first cause when any provider failed.
    pub fn into_verdict(self) -> Result<Vec<SubmissionOutcome>> {
        if !self.failed {
            return Ok(self.outcomes);
        }
        Err(Error::ProvidersFailed {
            failed: self.failed_count(),
            total: self.outcomes.len(),
            cause: self.first_cause().unwrap_or_default(),
        })
    }
}

/// Submit to every named provider concurrently.
///
/// Every provider is attempted regardless of how the others fare. The
/// returned outcomes follow the order of `providers`.
#[instrument(skip_all, fields(providers = providers.len()))]
pub async fn run_all<S: AsRef<str>>(
    registry: &ProviderRegistry,
    transport: &dyn HttpTransport,
    providers: &[S],
    context: &SubmissionContext,
) -> AggregateResult {
    let submissions = providers
        .iter()
        .map(|name| registry.submit(name.as_ref(), transport, context));
    let aggregate = AggregateResult::from_outcomes(join_all(submissions).await);

    info!(
        total = aggregate.outcomes.len(),
        failed = aggregate.failed_count(),
        "Provider submissions complete"
    );
    aggregate
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::Fetcher;
    use crate::provider::{OutcomeStatus, UrlList};
    use std::collections::BTreeMap;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> SubmissionContext {
        SubmissionContext::new(Url::parse("https://example.com/sitemap.xml").unwrap())
    }

    fn registry(endpoints: &[(&str, String)]) -> ProviderRegistry {
        let endpoints: BTreeMap<String, String> = endpoints
            .iter()
            .map(|(name, url)| ((*name).to_string(), url.clone()))
            .collect();
        ProviderRegistry::builtin().with_endpoints(&endpoints)
    }

    #[tokio::test]
    async fn test_single_ping_success() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let registry = registry(&[("google", format!("{}/ping", server.uri()))]);
        let fetcher = Fetcher::new()?;
        let result = run_all(&registry, &fetcher, &["google"], &context()).await;

        assert!(!result.failed);
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.outcomes[0].status, OutcomeStatus::Success);
        assert!(result.into_verdict().is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_order_and_first_cause() -> anyhow::Result<()> {
        let failing = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(100)))
            .expect(1)
            .mount(&failing)
            .await;
        let healthy = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexnow"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&healthy)
            .await;

        let registry = registry(&[
            ("google", format!("{}/ping", failing.uri())),
            ("indexnow", format!("{}/indexnow", healthy.uri())),
        ]);
        let ctx = SubmissionContext {
            url_list: UrlList::Resolved(
                ["https://example.com/a", "https://example.com/b", "https://example.com/c"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ),
            indexnow_key: Some("abc123".to_string()),
            ..context()
        };

        let fetcher = Fetcher::new()?;
        let result = run_all(&registry, &fetcher, &["google", "indexnow"], &ctx).await;

        assert!(result.failed);
        assert_eq!(result.outcomes[0].provider, "google");
        assert_eq!(result.outcomes[0].status, OutcomeStatus::Error);
        assert_eq!(result.outcomes[1].status, OutcomeStatus::Success);
        match result.into_verdict() {
            Err(Error::ProvidersFailed {
                failed,
                total,
                cause,
            }) => {
                assert_eq!((failed, total), (1, 2));
                assert!(cause.starts_with("google:"));
                assert!(cause.contains("500"));
            },
            other => panic!("Expected ProvidersFailed, got: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_providers_are_submitted_concurrently() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        for route in ["/indexnow", "/yandex"] {
            Mock::given(method("POST"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
                .expect(1)
                .mount(&server)
                .await;
        }

        let registry = registry(&[
            ("indexnow", format!("{}/indexnow", server.uri())),
            ("yandex", format!("{}/yandex", server.uri())),
        ]);
        let ctx = SubmissionContext {
            url_list: UrlList::Resolved(
                std::iter::once("https://example.com/a".to_string()).collect(),
            ),
            indexnow_key: Some("abc123".to_string()),
            ..context()
        };

        let fetcher = Fetcher::new()?;
        let start = std::time::Instant::now();
        let result = run_all(&registry, &fetcher, &["indexnow", "yandex"], &ctx).await;
        let elapsed = start.elapsed();

        assert!(!result.failed);
        assert_eq!(result.outcomes.len(), 2);
        assert!(
            elapsed < Duration::from_millis(600),
            "providers submitted one after another: {elapsed:?}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_siblings() -> anyhow::Result<()> {
        let failing = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&failing)
            .await;

        let registry = registry(&[("google", format!("{}/ping", failing.uri()))]);
        let fetcher = Fetcher::new()?;
        let result = run_all(
            &registry,
            &fetcher,
            &["altavista", "google", "bing"],
            &context(),
        )
        .await;

        let statuses: Vec<OutcomeStatus> = result.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![OutcomeStatus::Error, OutcomeStatus::Error, OutcomeStatus::Warning]
        );
        assert_eq!(result.failed_count(), 2);
        let causes = result.causes();
        assert_eq!(causes.len(), 2);
        assert!(causes[0].contains("altavista"));
        assert!(causes[1].contains("503"));
        Ok(())
    }

    #[tokio::test]
    async fn test_deprecated_provider_does_not_fail_run() -> anyhow::Result<()> {
        let fetcher = Fetcher::new()?;
        let result = run_all(&ProviderRegistry::builtin(), &fetcher, &["bing"], &context()).await;

        assert!(!result.failed);
        assert_eq!(result.outcomes[0].status, OutcomeStatus::Warning);
        assert_eq!(result.failed_count(), 0);
        assert!(result.first_cause().is_none());
        Ok(())
    }

    #[test]
    fn test_failed_iff_any_error() {
        let all_ok = AggregateResult::from_outcomes(vec![
            SubmissionOutcome::success("a", "ok"),
            SubmissionOutcome::warning("b", "skipped"),
        ]);
        assert!(!all_ok.failed);

        let one_bad = AggregateResult::from_outcomes(vec![
            SubmissionOutcome::success("a", "ok"),
            SubmissionOutcome::error("b", "Submission failed", None),
        ]);
        assert!(one_bad.failed);
        assert_eq!(one_bad.first_cause().as_deref(), Some("b: Submission failed"));

        assert!(!AggregateResult::from_outcomes(Vec::new()).failed);
    }
}
