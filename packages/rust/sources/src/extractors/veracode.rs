//! Veracode release notes from a fixed list of category pages.

use async_trait::async_trait;
use releasewatch_shared::DraftUpdate;

use super::{UpdateSource, collect_pages, parse_dated_notes};
use crate::dates::HeadingDates;
use crate::fetch::PageFetcher;

/// Category pages under the Veracode product-updates site.
const VERACODE_PAGES: [&str; 11] = [
    "https://docs.veracode.com/updates/r/Veracode_CLI_Updates",
    "https://docs.veracode.com/updates/r/c_all_was",
    "https://docs.veracode.com/updates/r/EASM_updates",
    "https://docs.veracode.com/updates/r/Fix_updates",
    "https://docs.veracode.com/updates/r/c_all_int",
    "https://docs.veracode.com/updates/r/Package_firewall_updates",
    "https://docs.veracode.com/updates/r/c_all_platform",
    "https://docs.veracode.com/updates/r/c_all_sca",
    "https://docs.veracode.com/updates/r/c_all_static",
    "https://docs.veracode.com/updates/r/c_all_training",
    "https://docs.veracode.com/updates/r/VRM_updates",
];

/// Static multi-page Veracode extractor.
pub struct VeracodeSource {
    fetcher: PageFetcher,
    pages: Vec<String>,
}

impl VeracodeSource {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self::with_pages(fetcher, VERACODE_PAGES.iter().map(|p| p.to_string()).collect())
    }

    /// Crawl `pages` instead of the built-in category list.
    pub fn with_pages(fetcher: PageFetcher, pages: Vec<String>) -> Self {
        Self { fetcher, pages }
    }
}

#[async_trait]
impl UpdateSource for VeracodeSource {
    fn key(&self) -> &str {
        "veracode"
    }

    fn tool_name(&self) -> &str {
        "Veracode"
    }

    async fn fetch_updates(&self) -> Vec<DraftUpdate> {
        collect_pages(&self.fetcher, self.tool_name(), &self.pages, |html, url| {
            parse_dated_notes(html, url, HeadingDates::Strict)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use releasewatch_shared::FetchConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[tokio::test]
    async fn failing_page_does_not_affect_siblings() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/updates/r/c_all_static"))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture("veracode-static.html")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/updates/r/c_all_was"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let broken = format!("{}/updates/r/c_all_was", server.uri());
        let working = format!("{}/updates/r/c_all_static", server.uri());
        let fetcher = PageFetcher::new(&FetchConfig::default()).unwrap();
        let source = VeracodeSource::with_pages(fetcher, vec![broken, working.clone()]);

        let drafts = source.fetch_updates().await;
        assert_eq!(drafts.len(), 2);
        assert!(drafts.iter().all(|d| d.link == working));
        assert_eq!(drafts[0].version, "Static Analysis updates - New Java rules");
        assert_eq!(drafts[1].category(), "Static Analysis updates");
    }

    #[tokio::test]
    async fn unreachable_pages_yield_empty_result() {
        let fetcher = PageFetcher::new(&FetchConfig::default()).unwrap();
        let source = VeracodeSource::with_pages(fetcher, vec!["http://127.0.0.1:9/nothing".into()]);
        assert!(source.fetch_updates().await.is_empty());
    }

    #[tokio::test]
    async fn default_pages_cover_every_category() {
        let fetcher = PageFetcher::new(&FetchConfig::default()).unwrap();
        let source = VeracodeSource::new(fetcher);
        assert_eq!(source.pages.len(), 11);
        assert_eq!(source.tool_name(), "Veracode");
    }
}
