//! Feed index parser.
//!
//! Only entry links are read, so RSS 0.9/1.0/2.0 and Atom indexes all work
//! and unknown elements are ignored. Indexes that no longer look like a
//! feed (missing `version`, unknown root) are scanned for `<item><link>`
//! instead.

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::events::Event;
use releasewatch_shared::{ReleaseWatchError, Result};
use tracing::debug;
use url::Url;

/// Extract the first link of every feed entry, in document order.
///
/// Links are trimmed, deduplicated, and dropped when they are not absolute
/// `http(s)` URLs or contain any of the `ignored` substrings.
pub(crate) fn parse_feed_links(body: &[u8], ignored: &[String]) -> Result<Vec<String>> {
    let hrefs: Vec<String> = match feed_rs::parser::parse(body) {
        Ok(feed) => feed
            .entries
            .into_iter()
            .filter_map(|entry| entry.links.into_iter().next().map(|l| l.href))
            .collect(),
        Err(feed_err) => match scan_item_links(body)? {
            Some(links) => {
                debug!(error = %feed_err, links = links.len(), "feed parser rejected index, scanned items");
                links
            }
            None => {
                return Err(ReleaseWatchError::parse(format!(
                    "invalid feed index: {feed_err}"
                )));
            }
        },
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in &hrefs {
        let href = href.trim();
        if href.is_empty() || !is_http_url(href) {
            continue;
        }
        if ignored.iter().any(|pattern| href.contains(pattern.as_str())) {
            continue;
        }
        if seen.insert(href.to_string()) {
            links.push(href.to_string());
        }
    }

    Ok(links)
}

/// First `<link>` text of every `<item>`, whatever the root element.
///
/// Returns `None` when the document has no `<item>` at all.
fn scan_item_links(body: &[u8]) -> Result<Option<Vec<String>>> {
    let xml_err = |e: quick_xml::Error| ReleaseWatchError::parse(format!("invalid feed index: {e}"));

    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut links = Vec::new();
    let mut saw_item = false;
    let mut item_depth = 0usize;
    let mut link_taken = false;
    let mut in_link = false;
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" => {
                    saw_item = true;
                    item_depth += 1;
                    link_taken = false;
                }
                b"link" if item_depth > 0 && !link_taken => {
                    in_link = true;
                    text.clear();
                }
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"item" => saw_item = true,
            Event::Text(t) if in_link => text.push_str(&t.unescape().map_err(xml_err)?),
            Event::CData(c) if in_link => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::End(e) => match e.local_name().as_ref() {
                b"link" if in_link => {
                    in_link = false;
                    link_taken = true;
                    links.push(text.trim().to_string());
                }
                b"item" => item_depth = item_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(saw_item.then_some(links))
}

fn is_http_url(href: &str) -> bool {
    Url::parse(href)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> Vec<u8> {
        let path = format!("../../../fixtures/rss/{name}");
        std::fs::read(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[test]
    fn extracts_item_links_in_order() {
        let body = load_fixture("veracode-updates.xml");
        let links = parse_feed_links(&body, &[]).unwrap();
        assert_eq!(links.len(), 4);
        assert_eq!(
            links[0],
            "https://docs.veracode.com/updates/r/Veracode_CLI_Updates"
        );
        assert!(links.iter().any(|l| l.contains("c_release_notes")));
    }

    #[test]
    fn ignore_list_filters_by_substring() {
        let body = load_fixture("veracode-updates.xml");
        let links = parse_feed_links(&body, &["c_release_notes".to_string()]).unwrap();
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|l| !l.contains("c_release_notes")));
    }

    #[test]
    fn duplicates_and_non_http_links_are_dropped() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Updates</title>
  <item><title>A</title><link>https://docs.example.com/a</link></item>
  <item><title>A again</title><link> https://docs.example.com/a </link></item>
  <item><title>Mail</title><link>mailto:docs@example.com</link></item>
  <item><title>No link</title><description>nothing here</description></item>
  <item><title>B</title><link>https://docs.example.com/b</link><extra>drift</extra></item>
</channel></rss>"#;
        let links = parse_feed_links(xml.as_bytes(), &[]).unwrap();
        assert_eq!(
            links,
            vec!["https://docs.example.com/a", "https://docs.example.com/b"]
        );
    }

    #[test]
    fn atom_feeds_are_accepted() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Updates</title><id>urn:updates</id><updated>2026-01-20T00:00:00Z</updated>
  <entry><title>Static</title><id>urn:1</id><updated>2026-01-20T00:00:00Z</updated>
    <link href="https://docs.example.com/static"/></entry>
</feed>"#;
        let links = parse_feed_links(xml.as_bytes(), &[]).unwrap();
        assert_eq!(links, vec!["https://docs.example.com/static"]);
    }

    #[test]
    fn drifted_index_without_version_still_yields_item_links() {
        let xml = r#"<?xml version="1.0"?><rss><channel><item><link>https://docs.example.com/a</link></item></channel></rss>"#;
        let links = parse_feed_links(xml.as_bytes(), &[]).unwrap();
        assert_eq!(links, vec!["https://docs.example.com/a"]);
    }

    #[test]
    fn drifted_index_applies_the_usual_filters() {
        let xml = r#"<?xml version="1.0"?>
<updates>
  <link>https://docs.example.com/channel-level</link>
  <item><name>CLI</name><link>https://docs.example.com/cli?a=1&amp;b=2</link><link>https://docs.example.com/second</link></item>
  <item><link><![CDATA[https://docs.example.com/cli?a=1&b=2]]></link></item>
  <item><link>https://docs.example.com/c_release_notes</link></item>
  <item><link>ftp://docs.example.com/static</link></item>
  <item><title>No link</title></item>
  <item><link> https://docs.example.com/static </link></item>
</updates>"#;
        let links = parse_feed_links(xml.as_bytes(), &["c_release_notes".to_string()]).unwrap();
        assert_eq!(
            links,
            vec![
                "https://docs.example.com/cli?a=1&b=2",
                "https://docs.example.com/static",
            ]
        );
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_feed_links(b"<html><body>Not a feed</body></html>", &[]).unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }
}
