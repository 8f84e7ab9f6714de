//! The crawl pipeline.
//!
//! One call runs strictly in sequence: resolve profile and proxy, fetch
//! (direct or delegated), pull further pages when replies are wanted, extract,
//! format replies, assemble, convert to Markdown. Nothing is kept between
//! calls apart from the configuration captured at construction.

use std::sync::Arc;
use std::time::Duration;

use url::Url;
use webclip_core::{AppConfig, ClipSettings, Error, SiteProfile, resolve_profile};

use crate::assemble::{CrawlResult, assemble, to_markdown};
use crate::extract::{ExtractionStrategy, StrategyRegistry, format_replies};
use crate::fetch::{
    FetchClient, FetchConfig, PlatformProxyResolver, ProxyResolver, RequestDefaults, ResolvedContext, Transport,
    canonicalize,
};
use crate::paginate::PaginationAggregator;
use crate::render::{RenderClient, RenderDetector};

pub struct Clipper {
    direct: FetchClient,
    renderer: RenderClient,
    detector: RenderDetector,
    registry: StrategyRegistry,
    proxies: ProxyResolver,
    defaults: RequestDefaults,
    page_delay: Duration,
    max_pages: usize,
}

impl Clipper {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            direct: FetchClient::new(FetchConfig::from_app(config)),
            renderer: RenderClient::from_app(config)?,
            detector: RenderDetector::from_app(config),
            registry: StrategyRegistry::with_defaults(),
            proxies: ProxyResolver::from_app(config),
            defaults: RequestDefaults {
                user_agent: config.user_agent.clone(),
                accept_language: config.accept_language.clone(),
            },
            page_delay: config.page_delay(),
            max_pages: config.max_pages,
        })
    }

    /// Use the host's proxy lookup for the platform step of proxy resolution.
    pub fn with_platform_proxy(mut self, platform: Arc<dyn PlatformProxyResolver>) -> Self {
        self.proxies = ProxyResolver::new(platform);
        self
    }

    /// Read proxy environment variables from `vars` instead of the process.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.proxies = self.proxies.with_env_vars(vars);
        self
    }

    pub fn registry_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.registry
    }

    pub fn detector_mut(&mut self) -> &mut RenderDetector {
        &mut self.detector
    }

    /// Proxy and headers for one request to `url`.
    pub fn context_for(&self, url: &Url, profiles: &[SiteProfile], settings: &ClipSettings) -> ResolvedContext {
        let profile = resolve_profile(url.as_str(), profiles);
        let proxy = self.proxies.resolve(url, settings);
        ResolvedContext::new(proxy, profile, &self.defaults)
    }

    /// Fetch `url` and turn it into a titled Markdown document.
    pub async fn fetch_web_content(
        &self, url: &str, profiles: &[SiteProfile], settings: &ClipSettings,
    ) -> Result<CrawlResult, Error> {
        let target = canonicalize(url)?;
        let context = self.context_for(&target, profiles, settings);

        let raw_html = if self.detector.needs_rendering(&target) {
            self.renderer.fetch(&target, &context).await?
        } else {
            self.direct.fetch(&target, &context).await?
        };

        let strategy = self.registry.select(&target);
        tracing::info!(url = %target, strategy = strategy.kind().as_str(), bytes = raw_html.len(), "clipping page");

        let merged = match strategy.pagination() {
            Some(rules) if settings.include_replies => {
                let thread = PaginationAggregator::new(&self.direct)
                    .with_delay(self.page_delay)
                    .with_max_pages(self.max_pages)
                    .aggregate(&target, &raw_html, rules, &context)
                    .await;
                if !thread.skipped.is_empty() {
                    tracing::warn!(skipped = thread.skipped.len(), pages = thread.pages, "thread is missing pages");
                }
                Some(thread.html)
            }
            _ => None,
        };

        let result = finish(strategy, merged.as_deref().unwrap_or(&raw_html), &target, settings.include_replies)?;
        Ok(CrawlResult { raw_html, ..result })
    }

    /// Extraction and assembly on HTML the caller already has. No network.
    pub fn clip_html(&self, html: &str, url: &Url, include_replies: bool) -> Result<CrawlResult, Error> {
        finish(self.registry.select(url), html, url, include_replies)
    }
}

fn finish(strategy: &dyn ExtractionStrategy, html: &str, url: &Url, include_replies: bool) -> Result<CrawlResult, Error> {
    let doc = strategy.extract(html, url);

    let replies = if include_replies { strategy.replies(html) } else { Vec::new() };
    let reply_count = replies.iter().filter(|r| !r.body_html.trim().is_empty()).count();
    let fragment = format_replies(&replies);

    let assembled = assemble(&doc, fragment.as_deref());
    let markdown = to_markdown(&assembled.html)?;

    tracing::debug!(title = %assembled.title, source = ?doc.source, reply_count, "document assembled");

    Ok(CrawlResult {
        title: assembled.title,
        markdown,
        raw_html: html.to_string(),
        strategy: strategy.kind(),
        reply_count,
    })
}
