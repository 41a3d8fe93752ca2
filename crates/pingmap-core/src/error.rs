//! Error types and handling for pingmap-core operations.
//!
//! Errors are categorized so callers can decide how far a failure should
//! propagate. Most failures inside the pipeline never reach the caller as an
//! `Err`: a broken nested sitemap becomes an empty branch and a failed provider
//! becomes an error outcome. Only configuration problems, a failed root
//! sitemap, and the aggregate "providers failed" verdict escalate.
//!
//! ## Error Categories
//!
//! - **Network Errors**: transport failures, non-success HTTP statuses
//! - **Timeout Errors**: the shared resolution deadline or a request timeout elapsed
//! - **Parse Errors**: malformed sitemap XML
//! - **Configuration Errors**: missing base URL, unparseable sitemap URL
//! - **Provider Errors**: unknown provider names, failed submissions
//! - **Storage Errors**: reading or writing the debounce state
//!
//! ```rust
//! use pingmap_core::Error;
//!
//! let err = Error::Timeout("sitemap resolution exceeded 60000ms".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "timeout");
//! ```

use thiserror::Error;

/// The main error type for pingmap-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Network operation failed.
    ///
    /// Connection refused, DNS failure, TLS handshake failure and similar
    /// transport problems. The underlying `reqwest::Error` is preserved.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote endpoint answered with a non-success status code.
    #[error("HTTP {status} from {url}")]
    Http {
        /// URL that was requested.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// Sitemap XML could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or incomplete.
    ///
    /// Fatal: the pipeline aborts before any network activity.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL is malformed or invalid.
    ///
    /// ## Common Causes
    ///
    /// - Base URL without a scheme (`example.com` instead of `https://example.com`)
    /// - Unsupported URL schemes
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Provider name does not match any known provider.
    #[error("Provider '{0}' is not a known provider")]
    InvalidProvider(String),

    /// A provider cannot be submitted to because a required input is missing.
    #[error("Provider '{provider}' requires {input}")]
    MissingInput {
        /// Provider that was being submitted to.
        provider: String,
        /// Description of the missing input.
        input: String,
    },

    /// Operation timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// At least one provider submission failed.
    ///
    /// Carries the number of failed providers and the first failure's cause.
    #[error("{failed} of {total} providers failed: {cause}")]
    ProvidersFailed {
        /// Number of providers with an error outcome.
        failed: usize,
        /// Number of providers attempted.
        total: usize,
        /// Cause of the first failure, in configured provider order.
        cause: String,
    },

    /// Debounce state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might go away on the next deployment.
    ///
    /// pingmap never retries on its own; this only decides the log level of a
    /// failed provider submission.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Timeout(_) | Self::ProvidersFailed { .. } => true,
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// - `"network"`, `"timeout"`, `"parse"`, `"config"`, `"provider"`,
    ///   `"submission"`, `"storage"`, `"serialization"`
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::Http { .. } => "network",
            Self::Timeout(_) => "timeout",
            Self::Parse(_) => "parse",
            Self::Config(_) | Self::InvalidUrl(_) => "config",
            Self::InvalidProvider(_) | Self::MissingInput { .. } => "provider",
            Self::ProvidersFailed { .. } => "submission",
            Self::Storage(_) => "storage",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
