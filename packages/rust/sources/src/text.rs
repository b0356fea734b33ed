//! Plain-text helpers over parsed HTML.

use scraper::ElementRef;

/// Zero-width characters docs generators put inside anchor links.
const ZERO_WIDTH: [char; 4] = ['\u{200b}', '\u{200c}', '\u{200d}', '\u{feff}'];

/// Visible text of an element: entities decoded, zero-width characters
/// removed, whitespace runs collapsed to single spaces.
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    collapse(&raw_text(el))
}

/// Concatenated descendant text, untouched apart from entity decoding.
pub(crate) fn raw_text(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

/// Collapse whitespace and drop zero-width characters.
pub(crate) fn collapse(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.replace(ZERO_WIDTH, ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Next sibling that is an element, skipping text and comment nodes.
pub(crate) fn next_element<'a>(el: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn collapse_strips_zero_width_and_whitespace() {
        assert_eq!(collapse("  Veracode\u{200b}  CLI\n\t v2 \u{200b} "), "Veracode CLI v2");
    }

    #[test]
    fn element_text_decodes_entities() {
        let doc = Html::parse_fragment("<p>A &amp; B &lt;c&gt; &quot;d&quot;&nbsp;e</p>");
        let sel = Selector::parse("p").unwrap();
        let p = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(&p), "A & B <c> \"d\" e");
    }

    #[test]
    fn next_element_skips_text_nodes() {
        let doc = Html::parse_fragment("<div><h3>T</h3>\n  text <p>P</p></div>");
        let sel = Selector::parse("h3").unwrap();
        let h3 = doc.select(&sel).next().unwrap();
        assert_eq!(next_element(&h3).unwrap().value().name(), "p");
    }
}
