//! Knowledge Q&A pages (Zhihu questions, answers and column articles).

use regex::{Captures, Regex};
use scraper::Html;
use std::sync::LazyLock;
use url::Url;

use super::html::{first_text, selector, title_of};
use super::{ContentSource, ExtractedDocument, ExtractionStrategy, GenericStrategy, StrategyKind};
use crate::fetch::url::bare_host;

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("invalid img regex"));

static LAZY_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bdata-(?:original|actualsrc)\s*=\s*"([^"]*)""#).expect("invalid lazy src regex"));

static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)\ssrc\s*=\s*"[^"]*""#).expect("invalid src regex"));

const TITLE_SELECTORS: [&str; 2] = ["h1.QuestionHeader-title", "h1.Post-Title"];
const BODY_SELECTORS: [&str; 3] = [".RichContent-inner", ".Post-RichTextContainer", ".RichText"];

#[derive(Debug, Clone, Default)]
pub struct AnswerStrategy {
    generic: GenericStrategy,
}

impl AnswerStrategy {
    pub fn new(generic: GenericStrategy) -> Self {
        Self { generic }
    }
}

impl ExtractionStrategy for AnswerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::KnowledgeAnswer
    }

    fn matches(&self, url: &Url) -> bool {
        let path = url.path();
        match bare_host(url).as_deref() {
            Some("zhihu.com") => path.starts_with("/question/") || path.contains("/answer/"),
            Some("zhuanlan.zhihu.com") => path.starts_with("/p/"),
            _ => false,
        }
    }

    fn extract(&self, html: &str, _url: &Url) -> ExtractedDocument {
        let document = Html::parse_document(html);
        let title = TITLE_SELECTORS.iter().find_map(|css| first_text(&document, css));

        let rich = BODY_SELECTORS.iter().find_map(|css| {
            document
                .select(&selector(css))
                .map(|el| el.inner_html())
                .find(|inner| !inner.trim().is_empty())
        });

        let doc = match rich {
            Some(body) => ExtractedDocument::assemble(
                title.or_else(|| title_of(&document)),
                &body,
                ContentSource::TopicContent,
                html,
            ),
            None => self.generic.extract_with_title(&document, title, html),
        };

        ExtractedDocument { body_html: promote_lazy_images(&doc.body_html), ..doc }
    }
}

/// Point each `<img>` at its lazy-load source so converters see the real image.
///
/// Tags without `data-original` / `data-actualsrc` are left alone. Running it
/// twice gives the same result.
pub fn promote_lazy_images(html: &str) -> String {
    IMG_TAG
        .replace_all(html, |caps: &Captures<'_>| {
            let tag = &caps[0];
            let Some(real) = LAZY_SRC.captures(tag).map(|c| c[1].to_string()).filter(|s| !s.is_empty()) else {
                return tag.to_string();
            };

            let without_src = SRC_ATTR.replace_all(tag, "");
            let rest = without_src.get(4..).unwrap_or_default();
            format!(r#"<img src="{real}"{rest}"#)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_matches() {
        let strategy = AnswerStrategy::default();
        assert!(strategy.matches(&url("https://www.zhihu.com/question/123")));
        assert!(strategy.matches(&url("https://www.zhihu.com/question/123/answer/456")));
        assert!(strategy.matches(&url("https://zhuanlan.zhihu.com/p/789")));
        assert!(!strategy.matches(&url("https://www.zhihu.com/people/someone")));
        assert!(!strategy.matches(&url("https://zhuanlan.zhihu.com/column")));
    }

    #[test]
    fn test_promote_lazy_images() {
        let html = r#"<p>a</p><img src="data:image/svg+xml;utf8,&lt;svg&gt;" data-actualsrc="https://pic1.zhimg.com/v2-abc.jpg" class="lazy"><img src="https://ok.test/x.png">"#;
        let out = promote_lazy_images(html);
        assert!(out.contains(r#"<img src="https://pic1.zhimg.com/v2-abc.jpg" data-actualsrc="https://pic1.zhimg.com/v2-abc.jpg" class="lazy">"#));
        assert!(out.contains(r#"<img src="https://ok.test/x.png">"#));
        assert!(!out.contains("data:image"));
        assert_eq!(promote_lazy_images(&out), out);
    }

    #[test]
    fn test_promote_without_existing_src() {
        let out = promote_lazy_images(r#"<IMG data-original="https://pic.test/o.jpg">"#);
        assert_eq!(out, r#"<img src="https://pic.test/o.jpg" data-original="https://pic.test/o.jpg">"#);
    }

    #[test]
    fn test_extract_answer() {
        let html = r#"<html><head><title>Question - Zhihu</title></head><body>
            <h1 class="QuestionHeader-title">How do compilers work?</h1>
            <div class="RichContent-inner"><p>They translate.</p><img src="placeholder.svg" data-original="https://pic.test/real.jpg"></div>
            </body></html>"#;
        let doc = AnswerStrategy::default().extract(html, &url("https://www.zhihu.com/question/1"));
        assert_eq!(doc.title, "How do compilers work?");
        assert_eq!(doc.source, ContentSource::TopicContent);
        assert!(doc.body_html.contains("They translate."));
        assert!(doc.body_html.contains(r#"src="https://pic.test/real.jpg""#));
        assert!(!doc.body_html.contains("placeholder.svg"));
    }

    #[test]
    fn test_column_article_without_rich_text_uses_generic() {
        let html = r#"<html><head><title>Column</title></head><body><article><p>Fallback text</p></article></body></html>"#;
        let doc = AnswerStrategy::default().extract(html, &url("https://zhuanlan.zhihu.com/p/2"));
        assert_eq!(doc.title, "Column");
        assert_eq!(doc.source, ContentSource::Article);
    }
}
