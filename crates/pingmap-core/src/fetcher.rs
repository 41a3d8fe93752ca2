//! HTTP access for sitemap fetches and provider submissions.
//!
//! Sitemaps are fetched with a lenient client (optional invalid-certificate
//! tolerance, compressed bodies); provider endpoints always go through a
//! client with full certificate validation.

use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default per-request timeout, matching the resolver's default budget.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP capability the resolver and provider adapters depend on.
///
/// Every method fails with [`Error::Http`] when the server answers with a
/// non-success status, so callers only ever see successful responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch a sitemap document and return its body.
    async fn fetch_sitemap(&self, url: &str) -> Result<String>;

    /// Issue a GET request, returning the status code.
    async fn get(&self, url: &Url) -> Result<u16>;

    /// POST a JSON body, returning the status code.
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<u16>;
}

/// Options for building a [`Fetcher`]
#[derive(Debug, Clone, Copy)]
pub struct FetcherOptions {
    /// Timeout applied to each individual request
    pub request_timeout: Duration,
    /// Accept invalid or self-signed certificates when fetching sitemaps.
    ///
    /// Provider endpoints are always contacted with full certificate validation.
    pub accept_invalid_certs: bool,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            accept_invalid_certs: true,
        }
    }
}

/// reqwest-backed [`HttpTransport`]
pub struct Fetcher {
    sitemap_client: Client,
    provider_client: Client,
}

impl Fetcher {
    /// Creates a new fetcher with default options
    pub fn new() -> Result<Self> {
        Self::with_options(FetcherOptions::default())
    }

    /// Creates a new fetcher with a custom request timeout (primarily for tests)
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::with_options(FetcherOptions {
            request_timeout: timeout,
            ..FetcherOptions::default()
        })
    }

    /// Creates a new fetcher from explicit options
    pub fn with_options(options: FetcherOptions) -> Result<Self> {
        let sitemap_client = Client::builder()
            .timeout(options.request_timeout)
            .user_agent(concat!("pingmap/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;

        let provider_client = Client::builder()
            .timeout(options.request_timeout)
            .user_agent(concat!("pingmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            sitemap_client,
            provider_client,
        })
    }
}

fn ensure_success(url: &str, response: &reqwest::Response) -> Result<u16> {
    let status = response.status();
    if status.is_success() {
        Ok(status.as_u16())
    } else {
        Err(Error::Http {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl HttpTransport for Fetcher {
    async fn fetch_sitemap(&self, url: &str) -> Result<String> {
        let response = self.sitemap_client.get(url).send().await?;
        ensure_success(url, &response)?;

        let body = response.text().await?;
        debug!(url = %url, bytes = body.len(), "Fetched sitemap");
        Ok(body)
    }

    async fn get(&self, url: &Url) -> Result<u16> {
        let response = self.provider_client.get(url.clone()).send().await?;
        ensure_success(url.as_str(), &response)
    }

    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<u16> {
        let response = self
            .provider_client
            .post(url.clone())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json; charset=utf-8",
            )
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;
        ensure_success(url.as_str(), &response)
    }
}
