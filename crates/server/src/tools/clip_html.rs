//! clip_html tool implementation.
//!
//! Extracts and assembles a document from HTML the client already has.
//! No network I/O is performed.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use webclip_client::Clipper;
use webclip_client::fetch::canonicalize;
use webclip_core::Error;

/// Input parameters for clip_html tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipHtmlParams {
    /// The raw HTML content to clip.
    pub html: String,

    /// URL the HTML came from. Selects the site-specific extraction strategy.
    pub url: String,

    /// Append forum replies found in the HTML.
    #[serde(default = "default_true")]
    pub include_replies: bool,
}

fn default_true() -> bool {
    true
}

/// Output structure for clip_html tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipHtmlOutput {
    pub title: String,
    pub markdown: String,
    pub strategy: String,
    pub reply_count: usize,
}

/// Implementation of the clip_html tool.
pub fn clip_html_impl(clipper: &Clipper, params: ClipHtmlParams) -> Result<CallToolResult, McpError> {
    if params.html.trim().is_empty() {
        return Err(Error::InvalidInput("html cannot be empty".into()).into());
    }

    let url = canonicalize(&params.url)?;
    let result = clipper.clip_html(&params.html, &url, params.include_replies)?;

    let output = ClipHtmlOutput {
        title: result.title,
        markdown: result.markdown,
        strategy: result.strategy.as_str().to_string(),
        reply_count: result.reply_count,
    };

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}
