//! Final document assembly and Markdown output.
//!
//! Title and body (plus the reply list, when requested) are combined into one
//! HTML document, which is then converted to Markdown with htmd.
//!
//! Optional frontmatter for saved clips:
//! ```yaml
//! ---
//! title: <page title>
//! source: <url>
//! fetched_at: <ISO8601 timestamp>
//! strategy: <strategy kind>
//! ---
//! <markdown body>
//! ```

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;
use webclip_core::Error;

use crate::extract::html::text_content;
use crate::extract::{ExtractedDocument, StrategyKind};

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("invalid blank line regex"));

/// Output of one crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub title: String,
    pub markdown: String,
    /// HTML as first fetched, before aggregation or extraction.
    pub raw_html: String,
    pub strategy: StrategyKind,
    /// Replies appended to the document (0 when replies were not requested).
    pub reply_count: usize,
}

/// Title plus the HTML handed to the Markdown converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub title: String,
    pub html: String,
}

/// Append the optional reply fragment to the extracted body.
pub fn assemble(doc: &ExtractedDocument, replies: Option<&str>) -> AssembledDocument {
    let mut html = doc.body_html.trim().to_string();
    if let Some(replies) = replies.filter(|r| !r.trim().is_empty()) {
        html.push_str("\n<hr>\n");
        html.push_str(replies);
    }
    AssembledDocument { title: doc.title.clone(), html }
}

/// Convert an HTML fragment to Markdown.
///
/// Runs of blank lines are collapsed. If the converter yields nothing for
/// non-blank input, the plain text is used instead.
pub fn to_markdown(html: &str) -> Result<String, Error> {
    let converted = htmd::convert(html).map_err(|e| Error::ConvertFailed(e.to_string()))?;
    let markdown = BLANK_LINES.replace_all(converted.trim(), "\n\n").into_owned();

    if markdown.is_empty() && !html.trim().is_empty() {
        return Ok(text_content(html));
    }
    Ok(markdown)
}

/// Prefix Markdown with YAML frontmatter.
pub fn with_frontmatter(result: &CrawlResult, source_url: &Url, fetched_at: &DateTime<Utc>) -> String {
    format!(
        "---\ntitle: {title}\nsource: {source}\nfetched_at: {timestamp}\nstrategy: {strategy}\n---\n{markdown}",
        title = escape_yaml(&result.title),
        source = source_url.as_str(),
        timestamp = fetched_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        strategy = result.strategy.as_str(),
        markdown = result.markdown.trim()
    )
}

/// Plain scalars cannot start with a YAML indicator character.
const YAML_INDICATORS: [char; 18] =
    ['"', '\'', '#', '-', '[', ']', '{', '}', '&', '*', '!', '%', '@', '`', '|', '>', '?', ','];

fn escape_yaml(s: &str) -> String {
    if s.is_empty() {
        "\"\"".to_string()
    } else if s.contains('\n')
        || s.contains(": ")
        || s.contains(" #")
        || s.ends_with(':')
        || s.starts_with(YAML_INDICATORS)
        || s.trim() != s
    {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " "))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ContentSource, extract};

    fn doc(body: &str) -> ExtractedDocument {
        ExtractedDocument { title: "Post".into(), body_html: body.into(), source: ContentSource::Article }
    }

    fn result(title: &str, markdown: &str) -> CrawlResult {
        CrawlResult {
            title: title.into(),
            markdown: markdown.into(),
            raw_html: String::new(),
            strategy: StrategyKind::Generic,
            reply_count: 0,
        }
    }

    #[test]
    fn test_assemble_appends_replies() {
        let assembled = assemble(&doc("<p>body</p>"), Some("<h2>Replies (1)</h2>"));
        assert_eq!(assembled.title, "Post");
        assert_eq!(assembled.html, "<p>body</p>\n<hr>\n<h2>Replies (1)</h2>");
    }

    #[test]
    fn test_assemble_without_replies() {
        assert_eq!(assemble(&doc(" <p>body</p> "), None).html, "<p>body</p>");
        assert_eq!(assemble(&doc("<p>body</p>"), Some("  ")).html, "<p>body</p>");
    }

    #[test]
    fn test_to_markdown() {
        let markdown = to_markdown("<h2>Title</h2><p>Hello <strong>world</strong></p><div><div><p>end</p></div></div>").unwrap();
        assert!(markdown.contains("## Title"));
        assert!(markdown.contains("Hello **world**"));
        assert!(!markdown.contains("\n\n\n"));
        assert!(!markdown.starts_with('\n'));
    }

    #[test]
    fn test_to_markdown_empty() {
        assert_eq!(to_markdown("").unwrap(), "");
    }

    #[test]
    fn test_reextracting_clean_body_is_stable() {
        let url = Url::parse("https://example.com/post").unwrap();
        let first = extract("<html><body><article><p>Clean <em>text</em></p><script>x()</script></article></body></html>", &url);
        let second = extract(&first.body_html, &url);
        assert_eq!(first.body_html, second.body_html);
    }

    #[test]
    fn test_frontmatter() {
        let url = Url::parse("https://example.com/post").unwrap();
        let fetched_at = DateTime::parse_from_rfc3339("2025-01-20T00:00:00Z").unwrap().with_timezone(&Utc);
        let out = with_frontmatter(&result("Test Title", "  # Heading\n\nContent \n"), &url, &fetched_at);

        assert!(out.starts_with("---\ntitle: Test Title\n"));
        assert!(out.contains("source: https://example.com/post"));
        assert!(out.contains("fetched_at: 2025-01-20T00:00:00Z"));
        assert!(out.contains("strategy: generic"));
        assert!(out.ends_with("# Heading\n\nContent"));
    }

    #[test]
    fn test_escape_yaml() {
        assert_eq!(escape_yaml("simple text"), "simple text");
        assert_eq!(escape_yaml(""), "\"\"");
        assert_eq!(escape_yaml("Title: Subtitle"), "\"Title: Subtitle\"");
        assert_eq!(escape_yaml("a:b"), "a:b");
        assert_eq!(escape_yaml("line1\nline2"), "\"line1 line2\"");
        assert_eq!(escape_yaml("say \"hi\""), "say \"hi\"");
        assert_eq!(escape_yaml("#1 \"hit\""), "\"#1 \\\"hit\\\"\"");
        assert_eq!(escape_yaml("Question:"), "\"Question:\"");
        assert_eq!(escape_yaml("@jack said"), "\"@jack said\"");
        assert_eq!(escape_yaml("%done"), "\"%done\"");
        assert_eq!(escape_yaml("`code`"), "\"`code`\"");
        assert_eq!(escape_yaml("| pipe"), "\"| pipe\"");
        assert_eq!(escape_yaml("> quote"), "\"> quote\"");
        assert_eq!(escape_yaml("? what"), "\"? what\"");
        assert_eq!(escape_yaml("issue #12"), "\"issue #12\"");
    }
}
