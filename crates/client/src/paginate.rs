//! Multi-page thread aggregation.
//!
//! ### Algorithm
//! - Read the reply count from the first page; no count means one page.
//! - Pages = `ceil(replies / page_size)`, capped at `max_pages`.
//! - Pages 2..N are fetched one after another through the direct transport,
//!   with a pacing delay before each of them, the first included.
//! - Each page's reply blocks are spliced into the first page right before
//!   the footer marker, so later pages only ever add to the first.
//! - A page that fails is logged and skipped; the rest still run.

use regex::Regex;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;
use webclip_core::Error;

use crate::fetch::url::resource_base;
use crate::fetch::{ResolvedContext, Transport};

/// Where replies live in a paginated thread and how pages are addressed.
#[derive(Debug, Clone)]
pub struct PaginationRules {
    /// Replies per page.
    pub page_size: usize,
    /// Pattern whose first capture group is the total reply count.
    pub reply_count: Regex,
    /// CSS selector for one reply block.
    pub reply_block: String,
    /// Markup that opens the page footer; captured replies go right before it.
    pub footer_marker: String,
    /// Query parameter carrying the page number.
    pub page_param: String,
}

impl PaginationRules {
    pub fn reply_count(&self, html: &str) -> Option<usize> {
        self.reply_count
            .captures(html)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Total pages for the thread, at least 1.
    pub fn total_pages(&self, html: &str) -> usize {
        self.reply_count(html)
            .map(|count| count.div_ceil(self.page_size.max(1)))
            .unwrap_or(1)
            .max(1)
    }

    /// `base?<page_param>=<page>` with any query or fragment of `url` dropped.
    pub fn page_url(&self, url: &Url, page: usize) -> Url {
        let mut page_url = resource_base(url);
        page_url
            .query_pairs_mut()
            .append_pair(&self.page_param, &page.to_string());
        page_url
    }

    /// Outer HTML of every reply block on a page, in document order.
    pub fn capture_replies(&self, html: &str) -> Option<String> {
        let block = Selector::parse(&self.reply_block).ok()?;
        let document = Html::parse_document(html);
        let blocks: Vec<String> = document.select(&block).map(|el| el.html()).collect();
        if blocks.is_empty() { None } else { Some(blocks.join("\n")) }
    }

    /// Insert `region` before the footer marker, or append when there is none.
    pub fn splice(&self, merged: &mut String, region: &str) {
        match merged.find(&self.footer_marker) {
            Some(at) => {
                merged.insert_str(at, region);
                merged.insert(at + region.len(), '\n');
            }
            None => {
                merged.push('\n');
                merged.push_str(region);
            }
        }
    }
}

/// A page that could not be added to the thread.
#[derive(Debug)]
pub struct PaginationPageError {
    pub page: usize,
    pub url: Url,
    pub error: Error,
}

/// First page with the replies of every later page merged in.
#[derive(Debug)]
pub struct AggregatedThread {
    pub html: String,
    /// Pages that made it into `html`, the first included.
    pub pages: usize,
    pub skipped: Vec<PaginationPageError>,
}

/// Pulls the remaining pages of a thread through one transport.
pub struct PaginationAggregator<'a> {
    transport: &'a dyn Transport,
    delay: Duration,
    max_pages: usize,
}

impl<'a> PaginationAggregator<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport, delay: Duration::from_millis(500), max_pages: 20 }
    }

    /// Pause between consecutive page fetches (default: 500ms).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Upper bound on pages, the first included (default: 20).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub async fn aggregate(
        &self, url: &Url, first_page: &str, rules: &PaginationRules, context: &ResolvedContext,
    ) -> AggregatedThread {
        let mut merged = first_page.to_string();
        let total = rules.total_pages(first_page);

        if total <= 1 {
            return AggregatedThread { html: merged, pages: 1, skipped: Vec::new() };
        }

        let last = total.min(self.max_pages);
        if last < total {
            tracing::warn!(total, max_pages = self.max_pages, "thread truncated to page limit");
        }

        tracing::info!(url = %url, pages = last, "aggregating thread pages");

        let mut pages = 1;
        let mut skipped = Vec::new();

        for page in 2..=last {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let page_url = rules.page_url(url, page);
            match self.transport.fetch(&page_url, context).await {
                Ok(html) => {
                    match rules.capture_replies(&html) {
                        Some(region) => rules.splice(&mut merged, &region),
                        None => tracing::debug!(page, "page has no reply blocks"),
                    }
                    pages += 1;
                }
                Err(error) => {
                    tracing::warn!(page, url = %page_url, "skipping page: {error}");
                    skipped.push(PaginationPageError { page, url: page_url, error });
                }
            }
        }

        AggregatedThread { html: merged, pages, skipped }
    }
}
