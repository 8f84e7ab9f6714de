//! Forum threads (V2EX layout): slug or header title, generic body, paged replies.

use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use url::Url;

use super::html::{element_text, first_text, selector};
use super::{ExtractedDocument, ExtractionStrategy, GenericStrategy, Reply, StrategyKind};
use crate::fetch::url::bare_host;
use crate::paginate::PaginationRules;

/// Replies per thread page.
pub const V2EX_PAGE_SIZE: usize = 100;

const ANONYMOUS: &str = "Anonymous";

static V2EX_RULES: LazyLock<PaginationRules> = LazyLock::new(|| PaginationRules {
    page_size: V2EX_PAGE_SIZE,
    reply_count: Regex::new(r"(\d+)\s*条回复").expect("invalid reply count regex"),
    reply_block: r#"div.cell[id^="r_"]"#.into(),
    footer_marker: r#"<div id="Bottom""#.into(),
    page_param: "p".into(),
});

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("invalid digits regex"));

#[derive(Debug, Clone, Default)]
pub struct ForumStrategy {
    generic: GenericStrategy,
}

impl ForumStrategy {
    pub fn new(generic: GenericStrategy) -> Self {
        Self { generic }
    }
}

impl ExtractionStrategy for ForumStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ForumThread
    }

    fn matches(&self, url: &Url) -> bool {
        bare_host(url).as_deref() == Some("v2ex.com") && url.path().starts_with("/t/")
    }

    fn extract(&self, html: &str, url: &Url) -> ExtractedDocument {
        let document = Html::parse_document(html);
        let title = slug_title(url).or_else(|| first_text(&document, ".header h1"));
        self.generic.extract_with_title(&document, title, html)
    }

    fn pagination(&self) -> Option<&PaginationRules> {
        Some(&V2EX_RULES)
    }

    fn replies(&self, html: &str) -> Vec<Reply> {
        let document = Html::parse_document(html);
        document
            .select(&selector(&V2EX_RULES.reply_block))
            .map(|cell| Reply { author: reply_author(&cell), body_html: reply_body(&cell), like_count: reply_likes(&cell) })
            .collect()
    }
}

/// Title embedded in the last path segment, for thread URLs carrying a slug.
fn slug_title(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let decoded = urlencoding::decode(segment).ok()?;
    let title = decoded.replace(['-', '_'], " ");
    let title = title.trim();
    if title.is_empty() { None } else { Some(title.to_string()) }
}

/// Display name, then the handle from the member link, then a placeholder.
fn reply_author(cell: &ElementRef<'_>) -> String {
    let link = cell.select(&selector("strong > a.dark")).next();

    link.map(|a| element_text(&a))
        .filter(|name| !name.is_empty())
        .or_else(|| {
            link.and_then(|a| a.value().attr("href"))
                .and_then(|href| href.rsplit_once("/member/"))
                .map(|(_, handle)| handle.trim_matches('/').to_string())
                .filter(|handle| !handle.is_empty())
        })
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

fn reply_body(cell: &ElementRef<'_>) -> String {
    cell.select(&selector(".reply_content"))
        .next()
        .map(|el| el.inner_html().trim().to_string())
        .unwrap_or_default()
}

/// Count next to the heart badge; no badge means zero.
fn reply_likes(cell: &ElementRef<'_>) -> u32 {
    let heart = selector(r#"img[alt="❤️"]"#);
    cell.select(&selector("span.small.fade"))
        .find(|span| span.select(&heart).next().is_some())
        .and_then(|span| {
            let text = element_text(&span);
            DIGITS.find(&text).and_then(|m| m.as_str().parse().ok())
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ContentSource;

    const THREAD: &str = r#"<html><head><title>Which editor do you use? - V2EX</title></head><body>
<div id="Main">
  <div class="box">
    <div class="header"><h1>Which editor do you use?</h1></div>
    <div class="cell"><div class="topic_content"><div class="markdown_body"><p>Curious what everyone runs.</p></div></div></div>
  </div>
  <div class="box">
    <div class="cell"><span class="gray">3 条回复</span></div>
    <div id="r_11" class="cell"><table><tr><td>
      <strong><a href="/member/alice" class="dark">alice</a></strong>
      <span class="small fade"><img src="/static/img/heart.png" alt="❤️" /> 12</span>
      <div class="reply_content">Vim, forever.</div>
    </td></tr></table></div>
    <div id="r_12" class="cell"><table><tr><td>
      <strong><a href="/member/bob" class="dark"></a></strong>
      <div class="reply_content">Helix lately.</div>
    </td></tr></table></div>
    <div id="r_13" class="cell"><table><tr><td>
      <div class="reply_content">   </div>
    </td></tr></table></div>
  </div>
</div>
<div id="Bottom">footer</div>
</body></html>"#;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_matches_thread_urls() {
        let strategy = ForumStrategy::default();
        assert!(strategy.matches(&url("https://www.v2ex.com/t/1024")));
        assert!(strategy.matches(&url("https://v2ex.com/t/1024?p=2")));
        assert!(!strategy.matches(&url("https://www.v2ex.com/go/programmer")));
        assert!(!strategy.matches(&url("https://example.com/t/1")));
    }

    #[test]
    fn test_extract_thread() {
        let doc = ForumStrategy::default().extract(THREAD, &url("https://www.v2ex.com/t/1024"));
        assert_eq!(doc.title, "Which editor do you use?");
        assert_eq!(doc.source, ContentSource::TopicContent);
        assert_eq!(doc.body_html, "<p>Curious what everyone runs.</p>");
    }

    #[test]
    fn test_slug_title_wins() {
        let doc = ForumStrategy::default().extract(THREAD, &url("https://www.v2ex.com/t/1024/best%20editor-thread"));
        assert_eq!(doc.title, "best editor thread");
        assert_eq!(slug_title(&url("https://www.v2ex.com/t/1024")), None);
    }

    #[test]
    fn test_replies() {
        let replies = ForumStrategy::default().replies(THREAD);
        assert_eq!(replies.len(), 3);

        assert_eq!(replies[0].author, "alice");
        assert_eq!(replies[0].like_count, 12);
        assert_eq!(replies[0].body_html, "Vim, forever.");

        assert_eq!(replies[1].author, "bob");
        assert_eq!(replies[1].like_count, 0);

        assert_eq!(replies[2].author, ANONYMOUS);
        assert!(replies[2].body_html.is_empty());
    }

    #[test]
    fn test_reply_count() {
        let rules = ForumStrategy::default().pagination().cloned().unwrap();
        assert_eq!(rules.reply_count(THREAD), Some(3));
        assert_eq!(rules.total_pages(THREAD), 1);
    }
}
