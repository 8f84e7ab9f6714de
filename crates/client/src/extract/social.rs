//! Single posts on X / Twitter.
//!
//! The post is rebuilt from targeted elements instead of the generic chain: a
//! small metadata header, the post body, then the attached images at their
//! largest size.

use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

use super::html::{escape_text, selector};
use super::{ContentSource, ExtractedDocument, ExtractionStrategy, GenericStrategy, StrategyKind};
use crate::fetch::url::host_is;

const TITLE_CHARS: usize = 30;
const ILLEGAL_TITLE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const LARGEST_VARIANT: &str = "4096x4096";

#[derive(Debug, Clone, Default)]
pub struct SocialStrategy {
    generic: GenericStrategy,
}

impl SocialStrategy {
    pub fn new(generic: GenericStrategy) -> Self {
        Self { generic }
    }
}

/// Pieces of a post found on the page.
#[derive(Debug, Default, PartialEq, Eq)]
struct Post {
    text: String,
    body_html: String,
    display_name: Option<String>,
    handle: Option<String>,
    posted_at: Option<String>,
    media: Vec<String>,
}

impl Post {
    fn parse(document: &Html) -> Self {
        let mut post = Post::default();

        if let Some(el) = document.select(&selector(r#"[data-testid="tweetText"]"#)).next() {
            post.text = el.text().collect();
            post.body_html = el.inner_html();
        }

        if let Some(el) = document
            .select(&selector(r#"[data-testid="User-Name"], [data-testid="User-Names"]"#))
            .next()
        {
            let (display_name, handle) = author_parts(&el);
            post.display_name = display_name;
            post.handle = handle;
        }

        post.posted_at = document
            .select(&selector("time[datetime]"))
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .map(str::to_string);

        let mut seen = HashSet::new();
        post.media = document
            .select(&selector(r#"img[src*="pbs.twimg.com/media/"]"#))
            .filter_map(|img| img.value().attr("src"))
            .filter(|src| seen.insert(media_key(src).to_string()))
            .map(upgrade_media_url)
            .collect();

        post
    }

    fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.display_name.is_none() && self.handle.is_none() && self.media.is_empty()
    }

    fn title(&self) -> Option<String> {
        let first_line = self.text.lines().map(str::trim).find(|line| !line.is_empty());
        if let Some(line) = first_line {
            let cleaned: String = line
                .chars()
                .take(TITLE_CHARS)
                .filter(|c| !ILLEGAL_TITLE_CHARS.contains(c))
                .collect();
            if !cleaned.trim().is_empty() {
                return Some(cleaned.trim().to_string());
            }
        }

        match (&self.display_name, &self.handle) {
            (Some(name), Some(handle)) => Some(format!("{name} ({handle})")),
            (Some(name), None) => Some(name.clone()),
            (None, Some(handle)) => Some(handle.clone()),
            (None, None) => None,
        }
    }

    fn to_html(&self) -> String {
        let mut html = String::new();

        for (label, value) in [("Author", &self.display_name), ("Handle", &self.handle), ("Posted", &self.posted_at)] {
            if let Some(value) = value {
                html.push_str(&format!("<p><strong>{label}:</strong> {}</p>\n", escape_text(value)));
            }
        }
        html.push_str("<hr>\n");

        if !self.body_html.trim().is_empty() {
            html.push_str(&format!("<div>{}</div>\n", self.body_html.trim()));
        }

        if !self.media.is_empty() {
            html.push_str("<h2>Images</h2>\n");
            for src in &self.media {
                html.push_str(&format!("<p><img src=\"{}\"></p>\n", escape_text(src)));
            }
        }

        html
    }
}

/// First `@`-prefixed text is the handle, first other text the display name.
fn author_parts(el: &ElementRef<'_>) -> (Option<String>, Option<String>) {
    let mut display_name = None;
    let mut handle = None;

    for text in el.text().map(str::trim).filter(|t| !t.is_empty() && *t != "·") {
        if text.starts_with('@') {
            handle.get_or_insert_with(|| text.to_string());
        } else {
            display_name.get_or_insert_with(|| text.to_string());
        }
    }

    (display_name, handle)
}

/// Media identity without size or format variants.
fn media_key(src: &str) -> &str {
    src.split_once('?').map(|(base, _)| base).unwrap_or(src)
}

/// Same media at the largest published size.
fn upgrade_media_url(src: &str) -> String {
    let Ok(mut url) = Url::parse(src) else {
        return src.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "name")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("name", LARGEST_VARIANT);
    url.to_string()
}

impl ExtractionStrategy for SocialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SocialPost
    }

    fn matches(&self, url: &Url) -> bool {
        (host_is(url, "x.com") || host_is(url, "twitter.com")) && url.path().contains("/status/")
    }

    fn extract(&self, html: &str, _url: &Url) -> ExtractedDocument {
        let document = Html::parse_document(html);
        let post = Post::parse(&document);

        if post.is_empty() {
            tracing::debug!("no post markup found, using generic extraction");
            return self.generic.extract_with_title(&document, None, html);
        }

        ExtractedDocument::assemble(post.title(), &post.to_html(), ContentSource::Synthesized, html)
    }
}
