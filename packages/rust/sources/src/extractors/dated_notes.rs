//! Parser for "date heading, then note sub-headings" release pages.
//!
//! The layout looks like:
//!
//! ```html
//! <h1>CLI updates</h1>
//! <h2>January 20, 2026</h2>
//! <h3>Veracode CLI v2.44.0</h3>
//! <p>Description of the note.</p>
//! <h3>Another note</h3>
//! <h2>December 9, 2025</h2>
//! ...
//! ```

use std::sync::LazyLock;

use regex::Regex;
use releasewatch_shared::DraftUpdate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::dates::HeadingDates;
use crate::text::{element_text, next_element};

/// Anchor boilerplate appended to headings by the docs generator.
static DIRECT_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Direct link to.*$").expect("direct link regex"));

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("h1 selector"));
static H2: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").expect("h2 selector"));

/// Extract one draft per note sub-heading under each date heading.
///
/// `version` is `"<page title> - <note title>"` and `link` is `page_url`.
pub fn parse_dated_notes(html: &str, page_url: &str, dates: HeadingDates) -> Vec<DraftUpdate> {
    let doc = Html::parse_document(html);

    let page_title = doc
        .select(&H1)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let mut drafts = Vec::new();

    for heading in doc.select(&H2) {
        let heading_text = element_text(&heading);
        let Some(date) = dates.parse(&heading_text) else {
            debug!(heading = %heading_text, "not a date heading");
            continue;
        };

        let mut current = next_element(&heading);
        while let Some(el) = current {
            match el.value().name() {
                "h2" => break,
                "h3" => {
                    let title = note_title(&el);
                    if title.is_empty() {
                        debug!(url = page_url, %date, "note heading without title, skipping");
                    } else {
                        drafts.push(DraftUpdate {
                            version: versioned(&page_title, &title),
                            date,
                            description: description_after(&el),
                            link: page_url.to_string(),
                        });
                    }
                }
                _ => {}
            }
            current = next_element(&el);
        }
    }

    drafts
}

/// Heading text without "Direct link to ..." and the trailing `#` marker.
fn note_title(heading: &ElementRef<'_>) -> String {
    let text = element_text(heading);
    let text = DIRECT_LINK_RE.replace(&text, "");
    let text = text.trim();
    text.strip_suffix('#').unwrap_or(text).trim().to_string()
}

/// Text of the element right after `heading`, if it is a paragraph.
fn description_after(heading: &ElementRef<'_>) -> String {
    match next_element(heading) {
        Some(el) if el.value().name() == "p" => element_text(&el),
        _ => String::new(),
    }
}

fn versioned(page_title: &str, title: &str) -> String {
    if page_title.is_empty() {
        title.to_string()
    } else {
        format!("{page_title} - {title}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const URL: &str = "https://docs.veracode.com/updates/r/Veracode_CLI_Updates";

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[test]
    fn strict_dates_extract_full_month_sections() {
        let drafts = parse_dated_notes(&fixture("veracode-cli.html"), URL, HeadingDates::Strict);
        let versions: Vec<&str> = drafts.iter().map(|d| d.version.as_str()).collect();
        assert_eq!(
            versions,
            vec![
                "CLI updates - Veracode CLI v2.44.0",
                "CLI updates - Container scanning & registries",
                "CLI updates - Veracode CLI v2.43.1",
            ]
        );

        assert_eq!(drafts[0].date, NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());
        assert_eq!(drafts[2].date, NaiveDate::from_ymd_opt(2025, 12, 9).unwrap());
        assert!(drafts.iter().all(|d| d.link == URL));
    }

    #[test]
    fn descriptions_are_plain_decoded_text() {
        let drafts = parse_dated_notes(&fixture("veracode-cli.html"), URL, HeadingDates::Strict);
        assert_eq!(
            drafts[0].description,
            "Adds SBOM & license reports to veracode scan, and improves container image detection."
        );
        // Followed by a list, not a paragraph.
        assert_eq!(drafts[1].description, "");
        assert_eq!(
            drafts[2].description,
            "Fixes a crash when <path> contains \"spaces\"."
        );
    }

    #[test]
    fn lenient_dates_add_abbreviated_sections() {
        let drafts = parse_dated_notes(&fixture("veracode-cli.html"), URL, HeadingDates::Lenient);
        assert_eq!(drafts.len(), 5);

        let legacy = &drafts[3];
        assert_eq!(legacy.version, "CLI updates - Legacy installer retired");
        assert_eq!(legacy.date, NaiveDate::from_ymd_opt(2025, 9, 3).unwrap());

        let sbom = &drafts[4];
        assert_eq!(sbom.version, "CLI updates - Early access: SBOM export");
        assert_eq!(sbom.date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
    }

    #[test]
    fn notes_under_non_date_headings_are_ignored() {
        let drafts = parse_dated_notes(&fixture("veracode-cli.html"), URL, HeadingDates::Lenient);
        assert!(!drafts.iter().any(|d| d.version.contains("Install the CLI")));
    }

    #[test]
    fn missing_page_title_keeps_bare_note_title() {
        let html = "<h2>January 20, 2026</h2><h3>Standalone note</h3><p>Body</p>";
        let drafts = parse_dated_notes(html, URL, HeadingDates::Strict);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].version, "Standalone note");
        assert_eq!(drafts[0].category(), "General");
    }

    #[test]
    fn page_without_dates_yields_nothing() {
        let html = "<h1>Updates</h1><h2>Overview</h2><h3>Intro</h3><p>Hi</p>";
        assert!(parse_dated_notes(html, URL, HeadingDates::Lenient).is_empty());
    }
}
