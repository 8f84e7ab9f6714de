//! Content extraction.
//!
//! ### Strategy dispatch
//! - Every site family gets an [`ExtractionStrategy`]; the registry picks the
//!   first whose `matches` accepts the URL, else the generic strategy.
//! - Strategies only read HTML. Network work (rendering, pagination) happens
//!   before extraction.
//!
//! ### Output
//! - `title` is never empty; a placeholder stands in when nothing is found.
//! - `body_html` has script, style and noscript blocks stripped and is never
//!   empty when the input HTML is not.

pub mod answer;
pub mod forum;
pub mod generic;
pub mod html;
pub mod replies;
pub mod social;

pub use answer::AnswerStrategy;
pub use forum::ForumStrategy;
pub use generic::{GenericConfig, GenericStrategy};
pub use replies::{Reply, format_replies};
pub use social::SocialStrategy;

use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

use crate::paginate::PaginationRules;

/// Title used when a page yields none.
pub const UNTITLED: &str = "Untitled";

/// Where the body of an [`ExtractedDocument`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// Forum topic container, or a site-specific container.
    TopicContent,
    Article,
    Main,
    /// One of the named content containers (`.post-content`, `#content`, ...).
    NamedContainer,
    /// Post assembled by the social strategy.
    Synthesized,
    /// Whole `<body>`.
    Body,
    /// The unmodified input.
    Raw,
}

impl ContentSource {
    pub fn is_low_confidence(self) -> bool {
        matches!(self, ContentSource::Body | ContentSource::Raw)
    }
}

/// Site family handled by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Generic,
    ForumThread,
    SocialPost,
    KnowledgeAnswer,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Generic => "generic",
            StrategyKind::ForumThread => "forum_thread",
            StrategyKind::SocialPost => "social_post",
            StrategyKind::KnowledgeAnswer => "knowledge_answer",
        }
    }
}

/// Title and body selected from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub title: String,
    pub body_html: String,
    pub source: ContentSource,
}

impl ExtractedDocument {
    /// Apply the output guarantees to a strategy's raw selection.
    pub(crate) fn assemble(title: Option<String>, body_html: &str, source: ContentSource, raw_html: &str) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let stripped = html::strip_noise(body_html);
        let (body_html, source) = if stripped.trim().is_empty() && !raw_html.trim().is_empty() {
            (raw_html.to_string(), ContentSource::Raw)
        } else {
            (stripped, source)
        };

        if source.is_low_confidence() {
            tracing::debug!(?source, "no content container matched");
        }

        Self { title, body_html, source }
    }
}

/// Extraction behaviour for one family of sites.
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn matches(&self, url: &Url) -> bool;

    fn extract(&self, html: &str, url: &Url) -> ExtractedDocument;

    /// Rules for pulling further pages of the same resource.
    fn pagination(&self) -> Option<&PaginationRules> {
        None
    }

    /// Replies found in (possibly merged) page HTML, in document order.
    fn replies(&self, _html: &str) -> Vec<Reply> {
        Vec::new()
    }
}

/// Ordered set of site strategies with a generic fallback.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    fallback: GenericStrategy,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl StrategyRegistry {
    /// Registry with only the generic strategy.
    pub fn empty(fallback: GenericStrategy) -> Self {
        Self { strategies: Vec::new(), fallback }
    }

    /// Forum thread, social post and knowledge answer strategies.
    pub fn with_defaults() -> Self {
        let generic = GenericStrategy::default();
        let mut registry = Self::empty(generic.clone());
        registry.register(ForumStrategy::new(generic.clone()));
        registry.register(SocialStrategy::new(generic.clone()));
        registry.register(AnswerStrategy::new(generic));
        registry
    }

    /// Append a strategy. Earlier registrations win on overlapping URLs.
    pub fn register<S: ExtractionStrategy + 'static>(&mut self, strategy: S) {
        self.strategies.push(Box::new(strategy));
    }

    pub fn select(&self, url: &Url) -> &dyn ExtractionStrategy {
        self.strategies
            .iter()
            .find(|s| s.matches(url))
            .map(|s| &**s)
            .unwrap_or(&self.fallback)
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }
}

static DEFAULT_REGISTRY: LazyLock<StrategyRegistry> = LazyLock::new(StrategyRegistry::with_defaults);

/// Extract title and body with the default strategies.
pub fn extract(html: &str, url: &Url) -> ExtractedDocument {
    DEFAULT_REGISTRY.select(url).extract(html, url)
}
