//! Veracode release notes from pages discovered through the RSS index.

use async_trait::async_trait;
use releasewatch_discovery::{DiscoveryOptions, discover};
use releasewatch_shared::{DraftUpdate, FetchConfig};
use tracing::{info, warn};

use super::{UpdateSource, collect_pages, parse_dated_notes};
use crate::dates::HeadingDates;
use crate::fetch::PageFetcher;

/// Index of all Veracode product-update categories.
const VERACODE_FEED_URL: &str = "https://docs.veracode.com/updates/rss.xml";

/// Feed-driven Veracode extractor. New categories are picked up as soon as
/// they appear in the index.
pub struct VeracodeRssSource {
    fetcher: PageFetcher,
    feed_url: String,
    discovery: DiscoveryOptions,
}

impl VeracodeRssSource {
    pub fn new(fetcher: PageFetcher, config: &FetchConfig) -> Self {
        Self {
            fetcher,
            feed_url: VERACODE_FEED_URL.to_string(),
            discovery: DiscoveryOptions {
                timeout_secs: config.timeout_secs,
                ignored: config.ignored_feed_urls.clone(),
            },
        }
    }

    /// Read the index from `feed_url` instead of the public feed.
    pub fn with_feed_url(mut self, feed_url: impl Into<String>) -> Self {
        self.feed_url = feed_url.into();
        self
    }
}

#[async_trait]
impl UpdateSource for VeracodeRssSource {
    fn key(&self) -> &str {
        "veracode-rss"
    }

    fn tool_name(&self) -> &str {
        "Veracode"
    }

    async fn fetch_updates(&self) -> Vec<DraftUpdate> {
        let pages = match discover(&self.feed_url, &self.discovery).await {
            Ok(pages) => pages,
            Err(e) => {
                warn!(feed_url = %self.feed_url, error = %e, "discovery failed, no pages to crawl");
                return Vec::new();
            }
        };
        info!(categories = pages.len(), "categories discovered");

        collect_pages(&self.fetcher, self.tool_name(), &pages, |html, url| {
            parse_dated_notes(html, url, HeadingDates::Lenient)
        })
        .await
    }
}
