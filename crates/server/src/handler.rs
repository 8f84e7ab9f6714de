//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{ClipHtmlParams, WebClipParams, clip_html_impl, clip_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use webclip_client::Clipper;
use webclip_core::AppConfig;

/// The main MCP server handler for webclip.
#[derive(Clone)]
pub struct WebClipServer {
    config: Arc<AppConfig>,
    clipper: Arc<Clipper>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl WebClipServer {
    /// Create a new server handler.
    pub fn new(config: AppConfig, clipper: Clipper) -> Self {
        Self { config: Arc::new(config), clipper: Arc::new(clipper), tool_router: Self::tool_router() }
    }

    /// Clip a web page.
    ///
    /// Fetches the URL (delegating to the rendering service for script-built
    /// sites), merges paged forum replies and returns Markdown.
    #[tool(
        description = "Clip a web page into Markdown. Applies matching site profiles and proxy settings, renders script-heavy sites through the rendering service, and appends forum replies when requested. Returns title, markdown, html, strategy and fetched_at."
    )]
    async fn web_clip(&self, params: Parameters<WebClipParams>) -> Result<CallToolResult, McpError> {
        clip_impl(&self.clipper, &self.config, params.0).await
    }

    /// Clip caller-supplied HTML.
    ///
    /// No network requests are made.
    #[tool(description = "Clip HTML you already have into Markdown using the site-specific strategy for its URL. No network access.")]
    async fn clip_html(&self, params: Parameters<ClipHtmlParams>) -> Result<CallToolResult, McpError> {
        clip_html_impl(&self.clipper, params.0)
    }
}

impl ServerHandler for WebClipServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "webclip".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> WebClipServer {
        let config = AppConfig::default();
        let clipper = Clipper::new(&config).unwrap();
        WebClipServer::new(config, clipper)
    }

    #[test]
    fn test_tools_are_registered() {
        let names: Vec<String> = server()
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        assert!(names.contains(&"web_clip".to_string()));
        assert!(names.contains(&"clip_html".to_string()));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_server_info() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "webclip");
    }
}
