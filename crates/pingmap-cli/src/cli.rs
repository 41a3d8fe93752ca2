//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Notify search engines after a production deploy
//! pingmap submit --base-url https://example.com --context production
//!
//! # Only IndexNow, at most once an hour
//! pingmap submit --providers indexnow --indexnow-key "$KEY" --ignore-period 3600
//!
//! # Inspect what a sitemap resolves to
//! pingmap resolve https://example.com/sitemap_index.xml --format json
//!
//! # List built-in providers
//! pingmap providers
//! ```
//!
//! Every `submit` input can also come from the environment (`URL`, `CONTEXT`,
//! `PINGMAP_*`) or from a TOML config file passed with `--config`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Main CLI structure for the `pingmap` command
#[derive(Parser, Clone, Debug)]
#[command(name = "pingmap")]
#[command(version)]
#[command(
    about = "pingmap - notify search engines that a sitemap changed",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Path to a TOML configuration file. Also via `PINGMAP_CONFIG`.
    #[arg(long, global = true, value_name = "FILE", env = "PINGMAP_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Resolve the sitemap and submit it to every configured provider
    Submit(SubmitArgs),

    /// Resolve a sitemap and print the URLs it lists, without submitting
    Resolve(ResolveArgs),

    /// List built-in providers
    Providers {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Arguments for `pingmap submit`
#[derive(Args, Clone, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct SubmitArgs {
    /// Base URL of the deployed site
    #[arg(long, value_name = "URL", env = "URL")]
    pub base_url: Option<String>,

    /// Sitemap path relative to the base URL [default: /sitemap.xml]
    #[arg(long, value_name = "PATH", env = "PINGMAP_SITEMAP_PATH")]
    pub sitemap_path: Option<String>,

    /// Providers to submit to, comma-separated [default: all built-in]
    #[arg(
        long,
        value_name = "NAMES",
        value_delimiter = ',',
        env = "PINGMAP_PROVIDERS"
    )]
    pub providers: Option<Vec<String>>,

    /// Minimum seconds between submissions; 0 disables the check
    #[arg(long, value_name = "SECONDS", env = "PINGMAP_IGNORE_PERIOD")]
    pub ignore_period: Option<u64>,

    /// IndexNow API key
    #[arg(long, value_name = "KEY", env = "PINGMAP_INDEXNOW_KEY")]
    pub indexnow_key: Option<String>,

    /// URL of the hosted IndexNow key file [default: <base>/<key>.txt]
    #[arg(long, value_name = "URL", env = "PINGMAP_KEY_LOCATION")]
    pub key_location: Option<String>,

    /// Time budget for resolving the whole sitemap tree, in milliseconds
    #[arg(long, value_name = "MS")]
    pub resolve_timeout_ms: Option<u64>,

    /// Per-request timeout, in milliseconds
    #[arg(long, value_name = "MS")]
    pub request_timeout_ms: Option<u64>,

    /// Maximum sitemap index nesting depth
    #[arg(long, value_name = "N")]
    pub max_depth: Option<u8>,

    /// Verify TLS certificates when fetching sitemaps
    #[arg(long)]
    pub strict_tls: bool,

    /// Override a provider endpoint (repeatable)
    #[arg(long = "endpoint", value_name = "NAME=URL")]
    pub endpoints: Vec<String>,

    /// Deploy context; only `production` deploys are submitted
    #[arg(long, value_name = "NAME", env = "CONTEXT")]
    pub context: Option<String>,

    /// Report what would happen without submitting
    #[arg(long, env = "PINGMAP_DRY_RUN")]
    pub dry_run: bool,

    /// Directory for the debounce state. Also via `PINGMAP_STATE_DIR`.
    #[arg(long, value_name = "DIR", env = "PINGMAP_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for `pingmap resolve`
#[derive(Args, Clone, Debug)]
pub struct ResolveArgs {
    /// Absolute sitemap URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Time budget for the whole resolution, in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum sitemap index nesting depth
    #[arg(long, value_name = "N")]
    pub max_depth: Option<u8>,

    /// Verify TLS certificates
    #[arg(long)]
    pub strict_tls: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    /// Output format of the selected command
    pub const fn format(&self) -> OutputFormat {
        match &self.command {
            Commands::Submit(args) => args.format,
            Commands::Resolve(args) => args.format,
            Commands::Providers { format } => *format,
        }
    }
}
