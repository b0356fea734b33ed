//! Feed-driven page discovery.
//!
//! Some vendors publish an RSS index of their release-note categories. Rather
//! than hardcoding those pages, feed-driven sources fetch the index and crawl
//! whatever it links to, so new categories are picked up automatically.

mod parser;

use releasewatch_shared::{ReleaseWatchError, Result};
use reqwest::Client;
use tracing::{debug, info, instrument};

/// Maximum number of redirects to follow when fetching the index.
const MAX_REDIRECTS: usize = 5;

/// Default timeout in seconds for fetching the index.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Maximum index size we accept (5 MB).
const MAX_RESPONSE_SIZE: u64 = 5 * 1024 * 1024;

/// `Accept` header sent with index requests.
const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml, text/xml";

/// User-Agent string for discovery requests.
const USER_AGENT: &str = concat!("ReleaseWatch/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery process.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// Links containing any of these substrings are dropped.
    pub ignored: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ignored: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch the feed index at `feed_url` and return the pages it links to.
///
/// Each entry contributes its first link. Links are deduplicated, kept in
/// document order, and filtered against [`DiscoveryOptions::ignored`].
#[instrument(skip_all, fields(feed_url = %feed_url))]
pub async fn discover(feed_url: &str, opts: &DiscoveryOptions) -> Result<Vec<String>> {
    info!("fetching feed index");

    let client = build_client(opts)?;
    let body = fetch_index(&client, feed_url).await?;
    let links = parser::parse_feed_links(&body, &opts.ignored)?;

    info!(pages = links.len(), "feed index parsed");
    for link in &links {
        debug!(%link, "discovered page");
    }

    Ok(links)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &DiscoveryOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(std::time::Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| ReleaseWatchError::Network(format!("failed to build HTTP client: {e}")))
}

/// Fetch the raw index bytes, rejecting non-2xx statuses and oversized bodies.
async fn fetch_index(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, FEED_ACCEPT)
        .send()
        .await
        .map_err(|e| ReleaseWatchError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReleaseWatchError::Network(format!("{url}: HTTP {status}")));
    }

    if let Some(len) = response.content_length() {
        if len > MAX_RESPONSE_SIZE {
            return Err(ReleaseWatchError::validation(format!(
                "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
            )));
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReleaseWatchError::Network(format!("{url}: failed to read body: {e}")))?;

    Ok(bytes.to_vec())
}
