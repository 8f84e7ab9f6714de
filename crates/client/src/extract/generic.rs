//! Generic content selection: an ordered chain of container guesses ending in
//! the whole `<body>` and finally the raw input.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::html::{element_text, selector, title_of};
use super::{ContentSource, ExtractedDocument, ExtractionStrategy, StrategyKind};

/// Knobs for the generic chain.
#[derive(Debug, Clone)]
pub struct GenericConfig {
    /// Class of the forum topic container tried first (default: `topic_content`).
    pub topic_content_class: String,

    /// Texts that mark a topic container as a login wall.
    pub login_markers: Vec<String>,

    /// Named containers need more visible characters than this (default: 50).
    pub min_container_chars: usize,

    /// Named container selectors, tried in order.
    pub named_containers: Vec<String>,
}

impl Default for GenericConfig {
    fn default() -> Self {
        Self {
            topic_content_class: "topic_content".into(),
            login_markers: ["需要先登录", "请先登录", "登录后查看", "You need to sign in"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_container_chars: 50,
            named_containers: [".post-content", "#content", ".content", r#"[itemprop="articleBody"]"#]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenericStrategy {
    config: GenericConfig,
}

impl Default for GenericStrategy {
    fn default() -> Self {
        Self::new(GenericConfig::default())
    }
}

impl GenericStrategy {
    pub fn new(config: GenericConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenericConfig {
        &self.config
    }

    /// Walk the container chain. `None` means only the raw input is left.
    pub(crate) fn select_body(&self, document: &Html) -> Option<(String, ContentSource)> {
        if let Some(topic) = self.topic_content(document) {
            return Some((topic, ContentSource::TopicContent));
        }

        for (css, source) in [("article", ContentSource::Article), ("main", ContentSource::Main)] {
            if let Some(inner) = first_non_blank(document, &selector(css)) {
                return Some((inner, source));
            }
        }

        for css in &self.config.named_containers {
            let Ok(sel) = Selector::parse(css) else {
                tracing::debug!(selector = %css, "skipping unparsable container selector");
                continue;
            };
            let found = document
                .select(&sel)
                .find(|el| element_text(el).chars().count() > self.config.min_container_chars);
            if let Some(el) = found {
                return Some((el.inner_html(), ContentSource::NamedContainer));
            }
        }

        first_non_blank(document, &selector("body")).map(|inner| (inner, ContentSource::Body))
    }

    /// Nested `.markdown_body` first, then the flat container. Login walls are skipped.
    fn topic_content(&self, document: &Html) -> Option<String> {
        let class = &self.config.topic_content_class;
        let candidates = [format!(".{class} .markdown_body"), format!(".{class}")];

        candidates
            .iter()
            .filter_map(|css| Selector::parse(css).ok())
            .find_map(|sel| {
                document.select(&sel).find_map(|el| {
                    let text = element_text(&el);
                    if text.is_empty() || self.is_login_wall(&text) { None } else { Some(el.inner_html()) }
                })
            })
    }

    fn is_login_wall(&self, text: &str) -> bool {
        self.config.login_markers.iter().any(|marker| text.contains(marker.as_str()))
    }

    /// Body selection plus the generic title, for strategies that only override part of it.
    pub(crate) fn extract_with_title(&self, document: &Html, title: Option<String>, raw_html: &str) -> ExtractedDocument {
        let (body, source) = self
            .select_body(document)
            .unwrap_or_else(|| (raw_html.to_string(), ContentSource::Raw));
        ExtractedDocument::assemble(title.or_else(|| title_of(document)), &body, source, raw_html)
    }
}

fn first_non_blank(document: &Html, sel: &Selector) -> Option<String> {
    document
        .select(sel)
        .map(|el: ElementRef<'_>| el.inner_html())
        .find(|inner| !inner.trim().is_empty())
}

impl ExtractionStrategy for GenericStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Generic
    }

    fn matches(&self, _url: &Url) -> bool {
        true
    }

    fn extract(&self, html: &str, _url: &Url) -> ExtractedDocument {
        let document = Html::parse_document(html);
        self.extract_with_title(&document, None, html)
    }
}
