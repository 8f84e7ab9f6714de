//! Client code for webclip.
//!
//! This crate provides the crawl pipeline: proxy and profile resolution,
//! direct and delegated transports, thread pagination, site-specific
//! extraction and Markdown assembly.

pub mod assemble;
pub mod clipper;
pub mod extract;
pub mod fetch;
pub mod paginate;
pub mod render;

pub use assemble::{AssembledDocument, CrawlResult, assemble, to_markdown, with_frontmatter};
pub use clipper::Clipper;
pub use extract::{
    ContentSource, ExtractedDocument, ExtractionStrategy, Reply, StrategyKind, StrategyRegistry, extract, format_replies,
};
pub use fetch::{
    FetchClient, FetchConfig, FetchResponse, PacProxyResolver, PlatformProxyResolver, ProxyResolver, ResolvedContext,
    Transport,
};
pub use paginate::{AggregatedThread, PaginationAggregator, PaginationPageError, PaginationRules};
pub use render::{RenderClient, RenderDetector, RenderError};
