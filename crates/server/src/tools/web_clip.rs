//! web_clip tool implementation.
//!
//! Runs the full crawl pipeline for one URL and returns the clipped document.

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use webclip_client::fetch::canonicalize;
use webclip_client::{Clipper, with_frontmatter};
use webclip_core::{AppConfig, Error};

/// Input parameters for web_clip tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebClipParams {
    /// The URL to clip.
    pub url: String,

    /// Append forum replies (overrides the configured default).
    #[serde(default)]
    pub include_replies: Option<bool>,

    /// Proxy URL for this call only, e.g. `http://127.0.0.1:7890`.
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Consult the platform proxy (overrides the configured default).
    #[serde(default)]
    pub use_platform_proxy: Option<bool>,

    /// Prefix the Markdown with YAML frontmatter.
    #[serde(default)]
    pub frontmatter: bool,

    /// Return the fetched HTML alongside the Markdown (default: true).
    #[serde(default = "default_true")]
    pub include_html: bool,
}

fn default_true() -> bool {
    true
}

/// Output structure for web_clip tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebClipOutput {
    /// The URL that was clipped.
    pub url: String,
    /// Document title.
    pub title: String,
    /// Document body as Markdown.
    pub markdown: String,
    /// HTML as first fetched (if include_html=true).
    pub html: Option<String>,
    /// Extraction strategy that handled the page.
    pub strategy: String,
    /// Number of replies appended.
    pub reply_count: usize,
    /// ISO8601 timestamp of when the content was fetched.
    pub fetched_at: String,
}

/// Implementation of the web_clip tool.
pub async fn clip_impl(clipper: &Clipper, config: &AppConfig, params: WebClipParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let mut settings = config.settings();
    if let Some(include_replies) = params.include_replies {
        settings.include_replies = include_replies;
    }
    if let Some(use_platform_proxy) = params.use_platform_proxy {
        settings.use_platform_proxy = use_platform_proxy;
    }
    if params.proxy_url.as_deref().is_some_and(|p| !p.trim().is_empty()) {
        settings.proxy_url = params.proxy_url.clone();
    }

    let result = clipper
        .fetch_web_content(&params.url, &config.site_profiles, &settings)
        .await?;
    let fetched_at = Utc::now();

    let markdown = if params.frontmatter {
        let source = canonicalize(&params.url)?;
        with_frontmatter(&result, &source, &fetched_at)
    } else {
        result.markdown.clone()
    };

    let output = WebClipOutput {
        url: params.url,
        title: result.title,
        markdown,
        html: params.include_html.then_some(result.raw_html),
        strategy: result.strategy.as_str().to_string(),
        reply_count: result.reply_count,
        fetched_at: fetched_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    };

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}
