//! SD Elements release notes from the yearly documentation archive.
//!
//! Each release is an `h2` whose `id` is the version without the dot
//! (`20254` for `2025.4`). The release date, when published, is a paragraph
//! somewhere below the heading; otherwise it is estimated from the version.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use releasewatch_shared::DraftUpdate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{UpdateSource, collect_pages};
use crate::dates::{estimate_from_version, parse_exact_date};
use crate::fetch::PageFetcher;
use crate::text::{collapse, element_text, next_element, raw_text};

/// Current year first, then the archived years.
const SD_ELEMENTS_PAGES: [&str; 3] = [
    "https://docs.sdelements.com/master/guide/docs/release_notes/",
    "https://docs.sdelements.com/master/guide/docs/release_notes/2024.html",
    "https://docs.sdelements.com/master/guide/docs/release_notes/2023.html",
];

/// Paragraph that introduces the curated feature list.
const FEATURES_MARKER: &str = "New features and enhancements";

/// Description used when a release lists no features.
const NO_FEATURES_DESCRIPTION: &str = "New release with improvements and fixes.";

const MAX_FEATURES: usize = 5;
const FEATURES_IN_DESCRIPTION: usize = 3;
const MAX_FEATURE_CHARS: usize = 50;
const MAX_FALLBACK_TITLE_CHARS: usize = 100;

static VERSION_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4,5}$").expect("version anchor regex"));

static H2_WITH_ID: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2[id]").expect("h2[id] selector"));

/// Version-anchor extractor for SD Elements.
pub struct SdElementsSource {
    fetcher: PageFetcher,
    pages: Vec<String>,
}

impl SdElementsSource {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self::with_pages(fetcher, SD_ELEMENTS_PAGES.iter().map(|p| p.to_string()).collect())
    }

    /// Crawl `pages` instead of the built-in archive list.
    pub fn with_pages(fetcher: PageFetcher, pages: Vec<String>) -> Self {
        Self { fetcher, pages }
    }
}

#[async_trait]
impl UpdateSource for SdElementsSource {
    fn key(&self) -> &str {
        "sd-elements"
    }

    fn tool_name(&self) -> &str {
        "SD Elements"
    }

    async fn fetch_updates(&self) -> Vec<DraftUpdate> {
        collect_pages(&self.fetcher, self.tool_name(), &self.pages, parse_release_page).await
    }
}

// ---------------------------------------------------------------------------
// Page parsing
// ---------------------------------------------------------------------------

/// Extract one draft per version-anchored `h2` on a release-notes page.
pub fn parse_release_page(html: &str, page_url: &str) -> Vec<DraftUpdate> {
    let doc = Html::parse_document(html);
    let mut drafts = Vec::new();

    for heading in doc.select(&H2_WITH_ID) {
        let Some(id) = heading.value().id() else {
            continue;
        };
        if !VERSION_ANCHOR_RE.is_match(id) {
            continue;
        }

        let version = collapse(&raw_text(&heading).replace("Anchor", ""));
        if version.is_empty() {
            debug!(%id, "version heading without text, skipping");
            continue;
        }

        let section = section_after(&heading);
        let Some(date) = published_date(&section).or_else(|| estimate_from_version(&version))
        else {
            debug!(%version, "no release date found, skipping");
            continue;
        };

        let features = extract_features(&section);
        drafts.push(DraftUpdate {
            version,
            date,
            description: describe(&features),
            link: format!("{page_url}#{id}"),
        });
    }

    drafts
}

/// Sibling elements after `heading`, up to the next `h2`.
fn section_after<'a>(heading: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut section = Vec::new();
    let mut current = next_element(heading);
    while let Some(el) = current {
        if el.value().name() == "h2" {
            break;
        }
        section.push(el);
        current = next_element(&el);
    }
    section
}

/// First paragraph in the section that is exactly a date.
fn published_date(section: &[ElementRef<'_>]) -> Option<chrono::NaiveDate> {
    section
        .iter()
        .filter(|el| el.value().name() == "p")
        .find_map(|p| parse_exact_date(&element_text(p)))
}

/// Feature titles for a release, at most [`MAX_FEATURES`].
///
/// Prefers the list right after the marker paragraph. Without a marker,
/// the first list that yields any titles is used. A marker that is not
/// followed by a list means the release has no listed features.
fn extract_features(section: &[ElementRef<'_>]) -> Vec<String> {
    for (i, el) in section.iter().enumerate() {
        if el.value().name() == "p" && element_text(el).contains(FEATURES_MARKER) {
            return match section.get(i + 1) {
                Some(list) if list.value().name() == "ul" => marked_list_titles(list),
                _ => Vec::new(),
            };
        }
    }

    section
        .iter()
        .filter(|el| el.value().name() == "ul")
        .map(fallback_list_titles)
        .find(|titles| !titles.is_empty())
        .unwrap_or_default()
}

/// First `p` of each `li`, first [`MAX_FEATURES`] items.
fn marked_list_titles(list: &ElementRef<'_>) -> Vec<String> {
    list_items(list)
        .take(MAX_FEATURES)
        .filter_map(|li| first_paragraph(&li))
        .collect()
}

/// First `p` of each `li`, else its first text line; long titles dropped.
fn fallback_list_titles(list: &ElementRef<'_>) -> Vec<String> {
    list_items(list)
        .take(MAX_FEATURES)
        .filter_map(|li| {
            first_paragraph(&li).or_else(|| {
                let raw = raw_text(&li);
                let line = collapse(raw.trim().lines().next().unwrap_or_default());
                (!line.is_empty()).then_some(line)
            })
        })
        .filter(|title| title.chars().count() < MAX_FALLBACK_TITLE_CHARS)
        .collect()
}

fn list_items<'a>(list: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "li")
}

fn first_paragraph(li: &ElementRef<'_>) -> Option<String> {
    li.children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "p")
        .map(|p| element_text(&p))
        .filter(|text| !text.is_empty())
}

/// Summarize features: first three, each capped, plus a `(+N more)` tail.
fn describe(features: &[String]) -> String {
    if features.is_empty() {
        return NO_FEATURES_DESCRIPTION.to_string();
    }

    let mut description = features
        .iter()
        .take(FEATURES_IN_DESCRIPTION)
        .map(|f| truncate_feature(f))
        .collect::<Vec<_>>()
        .join("; ");

    if features.len() > FEATURES_IN_DESCRIPTION {
        description.push_str(&format!(
            " (+{} more)",
            features.len() - FEATURES_IN_DESCRIPTION
        ));
    }
    description
}

fn truncate_feature(feature: &str) -> String {
    if feature.chars().count() > MAX_FEATURE_CHARS {
        let head: String = feature.chars().take(MAX_FEATURE_CHARS - 3).collect();
        format!("{head}...")
    } else {
        feature.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use releasewatch_shared::FetchConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URL: &str = "https://docs.sdelements.com/master/guide/docs/release_notes/";

    fn fixture() -> String {
        std::fs::read_to_string("../../../fixtures/html/sdelements-2025.html")
            .expect("read sdelements fixture")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn extracts_versioned_releases_in_page_order() {
        let drafts = parse_release_page(&fixture(), URL);
        let versions: Vec<&str> = drafts.iter().map(|d| d.version.as_str()).collect();
        assert_eq!(versions, vec!["2025.4", "2025.3", "2025.2", "2025.1"]);
        assert_eq!(drafts[0].link, format!("{URL}#20254"));
        assert_eq!(drafts[0].category(), "General");
    }

    #[test]
    fn missing_date_is_estimated_from_quarter() {
        let drafts = parse_release_page(&fixture(), URL);
        assert_eq!(drafts[0].date, date(2025, 11, 15));
        assert_eq!(drafts[2].date, date(2025, 5, 15));
    }

    #[test]
    fn published_date_paragraph_wins() {
        let drafts = parse_release_page(&fixture(), URL);
        assert_eq!(drafts[1].date, date(2025, 9, 27));
        assert_eq!(drafts[3].date, date(2025, 2, 14));
    }

    #[test]
    fn marked_feature_list_is_summarized() {
        let drafts = parse_release_page(&fixture(), URL);
        assert_eq!(
            drafts[0].description,
            "Threat modeling diagrams now support swimlanes ...; Jira Cloud sync; SAML group mapping (+1 more)"
        );
    }

    #[test]
    fn fallback_list_uses_first_line_of_plain_items() {
        let drafts = parse_release_page(&fixture(), URL);
        assert_eq!(
            drafts[1].description,
            "Risk policy templates; Bulk task assignment"
        );
    }

    #[test]
    fn releases_without_features_get_fallback_sentence() {
        let drafts = parse_release_page(&fixture(), URL);
        assert_eq!(drafts[2].description, NO_FEATURES_DESCRIPTION);
        // Marker present but not followed by a list.
        assert_eq!(drafts[3].description, NO_FEATURES_DESCRIPTION);
    }

    #[test]
    fn non_version_anchors_are_ignored() {
        let drafts = parse_release_page(&fixture(), URL);
        assert!(!drafts.iter().any(|d| d.version.contains("Known issues")));
        // id looks like a version but the text has no YYYY.Q and no date.
        assert!(!drafts.iter().any(|d| d.version == "Archive"));
    }

    #[test]
    fn describe_caps_feature_count_and_length() {
        let features: Vec<String> = (1..=5).map(|i| format!("Feature {i}")).collect();
        assert_eq!(
            describe(&features),
            "Feature 1; Feature 2; Feature 3 (+2 more)"
        );
        assert_eq!(describe(&["x".repeat(50)]), "x".repeat(50));
        assert_eq!(describe(&["y".repeat(51)]), format!("{}...", "y".repeat(47)));
    }

    #[tokio::test]
    async fn failing_year_page_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/release_notes/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/release_notes/2024.html"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&FetchConfig::default()).unwrap();
        let source = SdElementsSource::with_pages(
            fetcher,
            vec![
                format!("{}/release_notes/", server.uri()),
                format!("{}/release_notes/2024.html", server.uri()),
            ],
        );

        let drafts = source.fetch_updates().await;
        assert_eq!(drafts.len(), 4);
        assert!(drafts[0].link.ends_with("/release_notes/#20254"));
    }
}
