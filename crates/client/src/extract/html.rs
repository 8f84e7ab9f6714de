//! Small HTML helpers shared by the extraction strategies.
//!
//! `scraper::Html` is not `Send`, so every function here parses, reads and
//! drops the document before returning owned strings.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>")
        .expect("invalid noise regex")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Parse a static CSS selector.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// Remove `<script>`, `<style>` and `<noscript>` blocks.
pub fn strip_noise(html: &str) -> String {
    NOISE.replace_all(html, "").into_owned()
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Visible text of an element, whitespace collapsed. Entities are already decoded.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first element matching `css` that has any text.
pub(crate) fn first_text(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

/// `<title>` text, falling back to the first `<h1>`.
pub fn document_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    title_of(&document)
}

pub(crate) fn title_of(document: &Html) -> Option<String> {
    first_text(document, "title").or_else(|| first_text(document, "h1"))
}

/// Plain text of a whole fragment.
pub fn text_content(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    collapse_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Escape text for inclusion in generated HTML.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_noise() {
        let html = r#"<p>keep</p><script type="text/javascript">var x = "<p>";</script><STYLE>p{}</STYLE><noscript><img src="t.gif"></noscript><p>also</p>"#;
        assert_eq!(strip_noise(html), "<p>keep</p><p>also</p>");
    }

    #[test]
    fn test_strip_noise_multiline() {
        let html = "<div>\n<script>\nline1\nline2\n</script >\n</div>";
        assert_eq!(strip_noise(html), "<div>\n\n</div>");
    }

    #[test]
    fn test_document_title_decodes_entities() {
        let html = "<html><head><title> Tom &amp; Jerry &lt;3 </title></head><body><h1>Other</h1></body></html>";
        assert_eq!(document_title(html).as_deref(), Some("Tom & Jerry <3"));
    }

    #[test]
    fn test_document_title_falls_back_to_h1() {
        let html = "<html><head><title>  </title></head><body><h1>Heading <em>one</em></h1></body></html>";
        assert_eq!(document_title(html).as_deref(), Some("Heading one"));
        assert_eq!(document_title("<p>nothing</p>"), None);
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_text_content() {
        assert_eq!(text_content("<p>Hello\n  <b>world</b></p>"), "Hello world");
    }
}
