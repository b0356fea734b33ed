//! Source trait and the registry of built-in vendor extractors.
//!
//! Every vendor is one [`UpdateSource`] implementation. The registry is an
//! explicit list; adding a vendor means adding an implementation here.

mod dated_notes;
mod sd_elements;
mod veracode;
mod veracode_rss;

use async_trait::async_trait;
use releasewatch_shared::{DraftUpdate, FetchConfig, ReleaseWatchError, Result};
use tracing::{info, warn};

use crate::fetch::PageFetcher;

pub use dated_notes::parse_dated_notes;
pub use sd_elements::{SdElementsSource, parse_release_page};
pub use veracode::VeracodeSource;
pub use veracode_rss::VeracodeRssSource;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A vendor-specific extractor producing draft updates.
///
/// `fetch_updates` never fails: a page that cannot be fetched or parsed
/// contributes nothing, and a failed discovery step yields an empty result.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Registry key used in config and on the command line.
    fn key(&self) -> &str;

    /// Tool name stored on every persisted update from this source.
    fn tool_name(&self) -> &str;

    /// Fetch and parse the vendor's current release notes.
    async fn fetch_updates(&self) -> Vec<DraftUpdate>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds the built-in sources in a fixed order.
pub struct SourceRegistry {
    sources: Vec<Box<dyn UpdateSource>>,
}

impl SourceRegistry {
    /// Create a registry with every built-in source sharing one fetcher.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let fetcher = PageFetcher::new(config)?;
        Ok(Self::from_sources(vec![
            Box::new(VeracodeSource::new(fetcher.clone())),
            Box::new(VeracodeRssSource::new(fetcher.clone(), config)),
            Box::new(SdElementsSource::new(fetcher)),
        ]))
    }

    /// Build a registry from an explicit list.
    pub fn from_sources(sources: Vec<Box<dyn UpdateSource>>) -> Self {
        Self { sources }
    }

    /// Look up a source by key.
    pub fn get(&self, key: &str) -> Option<&dyn UpdateSource> {
        self.sources
            .iter()
            .find(|s| s.key() == key)
            .map(|s| s.as_ref())
    }

    /// Resolve `keys` in the given order. Unknown keys are a validation error.
    pub fn select(&self, keys: &[String]) -> Result<Vec<&dyn UpdateSource>> {
        keys.iter()
            .map(|key| {
                self.get(key).ok_or_else(|| {
                    ReleaseWatchError::validation(format!(
                        "unknown source '{key}' (available: {})",
                        self.keys().join(", ")
                    ))
                })
            })
            .collect()
    }

    /// All registered keys, in registry order.
    pub fn keys(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.key()).collect()
    }

    /// Iterate all registered sources.
    pub fn iter(&self) -> impl Iterator<Item = &dyn UpdateSource> {
        self.sources.iter().map(|s| s.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Shared page loop
// ---------------------------------------------------------------------------

/// Fetch `pages` one at a time and parse each with `parse(html, url)`.
///
/// A failing page is logged and skipped; its siblings are unaffected.
pub(crate) async fn collect_pages<F>(
    fetcher: &PageFetcher,
    tool: &str,
    pages: &[String],
    parse: F,
) -> Vec<DraftUpdate>
where
    F: Fn(&str, &str) -> Vec<DraftUpdate>,
{
    let mut all = Vec::new();

    for url in pages {
        info!(tool, %url, "fetching page");
        match fetcher.fetch_text(url).await {
            Ok(html) => {
                let drafts = parse(&html, url);
                info!(tool, %url, updates = drafts.len(), "page parsed");
                all.extend(drafts);
            }
            Err(e) => {
                warn!(tool, %url, error = %e, "page failed, skipping");
            }
        }
    }

    info!(tool, total = all.len(), "source finished");
    all
}
