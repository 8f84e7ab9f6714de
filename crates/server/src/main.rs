//! webclip server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use webclip_client::Clipper;
use webclip_core::AppConfig;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let clipper = Clipper::new(&config).context("failed to build crawl pipeline")?;

    tracing::info!(
        render_service = %config.render_service_url,
        render_sites = config.render_sites.len(),
        platform_proxy = config.platform_proxy.is_some(),
        site_profiles = config.site_profiles.len(),
        "Starting webclip server on stdio transport"
    );

    let handler = handler::WebClipServer::new(config, clipper);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
