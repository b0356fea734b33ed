//! HTTP page fetcher shared by all sources.

use std::time::Duration;

use releasewatch_shared::{FetchConfig, ReleaseWatchError, Result};
use reqwest::Client;
use tracing::debug;

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; ReleaseWatch/", env!("CARGO_PKG_VERSION"), ")");

/// `Accept` header sent with page requests.
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Fetches vendor pages as text. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Build a fetcher whose requests time out after `config.timeout_secs`.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ReleaseWatchError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, HTML_ACCEPT)
            .send()
            .await
            .map_err(|e| ReleaseWatchError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReleaseWatchError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReleaseWatchError::Network(format!("{url}: failed to read body: {e}")))?;

        debug!(%url, bytes = body.len(), "page loaded");
        Ok(body)
    }
}
