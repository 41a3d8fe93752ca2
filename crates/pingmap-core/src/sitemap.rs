//! Sitemap parsing and recursive resolution.
//!
//! A sitemap is either a `<urlset>` listing page URLs or a `<sitemapindex>`
//! pointing at further sitemaps. [`SitemapResolver`] follows indexes
//! recursively, fetching children in parallel, and returns the flat,
//! deduplicated set of page URLs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pingmap_core::{Fetcher, SitemapResolver};
//! use pingmap_core::sitemap::DEFAULT_RESOLVE_BUDGET;
//! use std::sync::Arc;
//!
//! # async fn example() -> pingmap_core::Result<()> {
//! let resolver = SitemapResolver::new(Arc::new(Fetcher::new()?));
//! let urls = resolver
//!     .resolve("https://example.com/sitemap.xml", DEFAULT_RESOLVE_BUDGET)
//!     .await?;
//! println!("Found {} URLs", urls.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Limits
//!
//! - One deadline covers the whole call tree. Nested fetches share it, so a
//!   slow child cannot claim a fresh budget of its own.
//! - Index nesting is capped at [`DEFAULT_MAX_DEPTH`] levels, and a child that
//!   points back at one of its ancestors is skipped.
//! - A failed child sitemap contributes no URLs; its siblings are unaffected.
//!   Only a failure on the root document fails the resolution.

use crate::{Error, HttpTransport, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;
use url::Url;

/// Default time budget for resolving a sitemap tree.
pub const DEFAULT_RESOLVE_BUDGET: Duration = Duration::from_millis(60_000);

/// Default maximum nesting depth for sitemap index files.
pub const DEFAULT_MAX_DEPTH: u8 = 5;

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>` with the `loc` of every `<url>` entry, in document order.
    UrlSet(Vec<String>),
    /// `<sitemapindex>` with the `loc` of every child `<sitemap>`, in document order.
    SitemapIndex(Vec<String>),
    /// Any other root element.
    Unrecognized,
}

#[derive(Debug, Clone, Copy)]
enum RootKind {
    UrlSet,
    Index,
}

impl RootKind {
    const fn entry_tag(self) -> &'static [u8] {
        match self {
            Self::UrlSet => b"url",
            Self::Index => b"sitemap",
        }
    }
}

impl SitemapDocument {
    /// Parse sitemap XML.
    ///
    /// The root element decides the variant. Entries without a `<loc>` are
    /// skipped. Parsing stops at the root element when it is neither
    /// `urlset` nor `sitemapindex`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pingmap_core::SitemapDocument;
    ///
    /// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
    /// <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    ///   <url><loc>https://example.com/page1</loc></url>
    /// </urlset>"#;
    ///
    /// let doc = SitemapDocument::parse(xml).unwrap();
    /// assert_eq!(doc, SitemapDocument::UrlSet(vec!["https://example.com/page1".into()]));
    /// ```
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut root: Option<RootKind> = None;
        let mut locs = Vec::new();
        let mut current_loc: Option<String> = None;
        let mut in_entry = false;
        let mut in_loc = false;
        // Open elements above the current event; the root sits at 0.
        let mut depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = e.local_name();
                    match root {
                        None => match name.as_ref() {
                            b"urlset" => root = Some(RootKind::UrlSet),
                            b"sitemapindex" => root = Some(RootKind::Index),
                            _ => return Ok(Self::Unrecognized),
                        },
                        Some(kind) => {
                            if depth == 1 && name.as_ref() == kind.entry_tag() {
                                in_entry = true;
                                current_loc = None;
                            } else if in_entry && depth == 2 && name.as_ref() == b"loc" {
                                // Extension children such as `image:loc` sit deeper
                                in_loc = true;
                            }
                        },
                    }
                    depth += 1;
                },
                Ok(Event::Empty(e)) if root.is_none() => {
                    return Ok(match e.local_name().as_ref() {
                        b"urlset" => Self::UrlSet(Vec::new()),
                        b"sitemapindex" => Self::SitemapIndex(Vec::new()),
                        _ => Self::Unrecognized,
                    });
                },
                Ok(Event::End(e)) => {
                    depth = depth.saturating_sub(1);
                    let name = e.local_name();
                    if in_loc && depth == 2 && name.as_ref() == b"loc" {
                        in_loc = false;
                    } else if in_entry
                        && depth == 1
                        && root.is_some_and(|k| name.as_ref() == k.entry_tag())
                    {
                        if let Some(loc) = current_loc.take() {
                            let loc = loc.trim();
                            if !loc.is_empty() {
                                locs.push(loc.to_string());
                            }
                        }
                        in_entry = false;
                    }
                },
                Ok(Event::Text(e)) if in_loc => {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    current_loc.get_or_insert_with(String::new).push_str(&text);
                },
                Ok(Event::CData(e)) if in_loc => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    current_loc.get_or_insert_with(String::new).push_str(&text);
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Parse(format!("XML parse error: {e}"))),
                _ => {},
            }
            buf.clear();
        }

        Ok(match root {
            Some(RootKind::UrlSet) => Self::UrlSet(locs),
            Some(RootKind::Index) => Self::SitemapIndex(locs),
            None => Self::Unrecognized,
        })
    }
}

/// Deduplicated set of absolute page URLs produced by resolution.
///
/// Iteration order is lexicographic and carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedUrlSet {
    urls: BTreeSet<String>,
}

impl ResolvedUrlSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unique URLs
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether the set holds no URLs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Whether the set contains `url` (exact string comparison)
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Iterate the URLs
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Collect the URLs into a vector
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.urls.iter().cloned().collect()
    }
}

impl FromIterator<String> for ResolvedUrlSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResolvedUrlSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.into_iter()
    }
}

/// Returns true for absolute `http`/`https` URLs.
fn is_absolute_http_url(candidate: &str) -> bool {
    Url::parse(candidate).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Recursively resolves sitemap documents into page URLs.
#[derive(Clone)]
pub struct SitemapResolver {
    transport: Arc<dyn HttpTransport>,
    max_depth: u8,
}

impl SitemapResolver {
    /// Create a resolver using the given transport
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the maximum sitemap index nesting depth
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve `root_url` into the set of page URLs it references.
    ///
    /// `budget` bounds the entire resolution. When it runs out, pending
    /// nested fetches are abandoned and contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the root document cannot be fetched within the
    /// budget, answers with a non-success status, or is malformed XML. A root
    /// document with an unrecognized shape yields an empty set instead.
    #[instrument(skip_all, fields(url = %root_url, budget_ms = budget.as_millis()))]
    pub async fn resolve(&self, root_url: &str, budget: Duration) -> Result<ResolvedUrlSet> {
        let deadline = Instant::now() + budget;
        let leaves = resolve_recursive(
            Arc::clone(&self.transport),
            root_url.to_string(),
            Vec::new(),
            0,
            self.max_depth,
            deadline,
        )
        .await?;

        let total = leaves.len();
        let resolved: ResolvedUrlSet = leaves
            .into_iter()
            .filter(|url| {
                let valid = is_absolute_http_url(url);
                if !valid {
                    tracing::debug!(url = %url, "Dropping sitemap entry that is not an absolute URL");
                }
                valid
            })
            .collect();

        tracing::debug!(
            entries = total,
            unique = resolved.len(),
            "Resolved sitemap"
        );
        Ok(resolved)
    }
}

type ResolveFuture = Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send>>;

/// Internal recursive resolver.
///
/// Uses `Box::pin` so the recursive future is `Send` for `tokio::spawn`, and
/// takes owned values to avoid lifetime issues with the recursive call.
fn resolve_recursive(
    transport: Arc<dyn HttpTransport>,
    url: String,
    ancestors: Vec<String>,
    depth: u8,
    max_depth: u8,
    deadline: Instant,
) -> ResolveFuture {
    Box::pin(async move {
        tracing::debug!(url = %url, depth = depth, "Fetching sitemap");

        let xml = tokio::time::timeout_at(deadline, transport.fetch_sitemap(&url))
            .await
            .map_err(|_| Error::Timeout(format!("sitemap deadline elapsed while fetching {url}")))??;

        match SitemapDocument::parse(&xml)? {
            SitemapDocument::UrlSet(locs) => Ok(locs),
            SitemapDocument::Unrecognized => {
                tracing::debug!(url = %url, "Document is neither a urlset nor a sitemap index");
                Ok(Vec::new())
            },
            SitemapDocument::SitemapIndex(children) => {
                if depth >= max_depth {
                    tracing::warn!(
                        url = %url,
                        max_depth = max_depth,
                        skipped = children.len(),
                        "Sitemap index nesting limit reached; skipping child sitemaps"
                    );
                    return Ok(Vec::new());
                }

                let mut chain = ancestors;
                chain.push(url);

                let mut handles = Vec::with_capacity(children.len());
                for child in children {
                    if !is_absolute_http_url(&child) {
                        tracing::debug!(child = %child, "Skipping child sitemap with invalid URL");
                        continue;
                    }
                    if chain.contains(&child) {
                        tracing::warn!(child = %child, "Skipping sitemap that references an ancestor");
                        continue;
                    }
                    handles.push((
                        child.clone(),
                        tokio::spawn(resolve_recursive(
                            Arc::clone(&transport),
                            child,
                            chain.clone(),
                            depth + 1,
                            max_depth,
                            deadline,
                        )),
                    ));
                }

                tracing::debug!(child_count = handles.len(), "Fetching child sitemaps from index");

                let mut all = Vec::new();
                for (child, handle) in handles {
                    match handle.await {
                        Ok(Ok(urls)) => all.extend(urls),
                        Ok(Err(e)) => {
                            tracing::warn!(child = %child, error = %e, "Failed to resolve child sitemap");
                        },
                        Err(e) => {
                            tracing::warn!(child = %child, error = %e, "Child sitemap task panicked");
                        },
                    }
                }
                Ok(all)
            },
        }
    })
}
