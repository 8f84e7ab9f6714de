//! Delegated rendering for pages whose content is built by client-side script.
//!
//! The browser itself runs in a separate rendering service. This module holds
//! the client for its `POST /crawl` protocol and the allow-list deciding which
//! URLs need it.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use webclip_core::{AppConfig, Error, Pattern, PatternError};

use crate::fetch::{ResolvedContext, Transport};

/// Errors that can occur while talking to the rendering service.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Nothing is listening on the service port.
    #[error("rendering service is not running at {endpoint}; start it (default port 3737) and retry")]
    Unavailable { endpoint: String },

    /// Timeout waiting for the service to answer.
    #[error("render timeout after {0}ms")]
    Timeout(u64),

    /// Service answered with a non-2xx status.
    #[error("rendering service returned status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Service reported `success: false`.
    #[error("render failed: {0}")]
    Failed(String),

    /// Success response without HTML, or a body that is not the expected JSON.
    #[error("invalid response from rendering service: {0}")]
    InvalidResponse(String),

    /// Any other transport-level failure.
    #[error("render request failed: {0}")]
    Request(String),
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Unavailable { .. } => Error::RenderServiceUnavailable(err.to_string()),
            RenderError::Timeout(_) => Error::FetchTimeout(err.to_string()),
            other => Error::RenderFailed(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct CrawlRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cookies: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CrawlReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the rendering service.
///
/// The service is local, so it is always reached without a proxy. The proxy
/// resolved for the target travels inside the request body instead.
#[derive(Debug, Clone)]
pub struct RenderClient {
    endpoint: Url,
    timeout: Duration,
    http: reqwest::Client,
}

impl RenderClient {
    pub fn new(service_url: &str, timeout: Duration) -> Result<Self, Error> {
        let base = Url::parse(service_url).map_err(|e| Error::InvalidUrl(format!("{service_url}: {e}")))?;
        let endpoint = base
            .join("/crawl")
            .map_err(|e| Error::InvalidUrl(format!("{service_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| Error::Network(format!("failed to build render client: {e}")))?;

        Ok(Self { endpoint, timeout, http })
    }

    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        Self::new(&config.render_service_url, config.render_timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Ask the service to render `url` and return the settled page HTML.
    pub async fn render(&self, url: &Url, context: &ResolvedContext) -> Result<String, RenderError> {
        let start = Instant::now();
        let body = CrawlRequest { url: url.as_str(), proxy: context.proxy_url.as_deref(), cookies: context.cookies() };

        tracing::info!(url = %url, endpoint = %self.endpoint, "delegating to rendering service");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<CrawlReply>(&text)
                .ok()
                .and_then(|reply| reply.error)
                .unwrap_or(text);
            return Err(RenderError::Rejected { status: status.as_u16(), message });
        }

        let reply: CrawlReply = serde_json::from_str(&text).map_err(|e| RenderError::InvalidResponse(e.to_string()))?;

        if !reply.success {
            return Err(RenderError::Failed(reply.error.unwrap_or_else(|| "unknown error".into())));
        }

        let html = reply
            .html
            .ok_or_else(|| RenderError::InvalidResponse("missing html field".into()))?;

        tracing::debug!("rendered {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), html.len());

        Ok(html)
    }

    fn classify(&self, err: reqwest::Error) -> RenderError {
        if err.is_connect() {
            RenderError::Unavailable { endpoint: self.endpoint.to_string() }
        } else if err.is_timeout() {
            RenderError::Timeout(self.timeout.as_millis() as u64)
        } else {
            RenderError::Request(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl Transport for RenderClient {
    async fn fetch(&self, url: &Url, context: &ResolvedContext) -> Result<String, Error> {
        Ok(self.render(url, context).await?)
    }
}

/// Allow-list of URL patterns that need delegated rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderDetector {
    patterns: Vec<Pattern>,
}

impl RenderDetector {
    /// Build from wildcard patterns. Malformed ones are skipped with a warning.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|raw| match Pattern::compile(raw.as_ref()) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("skipping render site: {e}");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn from_app(config: &AppConfig) -> Self {
        Self::new(&config.render_sites)
    }

    /// Add a site at runtime.
    pub fn push(&mut self, pattern: &str) -> Result<(), PatternError> {
        self.patterns.push(Pattern::compile(pattern)?);
        Ok(())
    }

    pub fn needs_rendering(&self, url: &Url) -> bool {
        self.patterns.iter().any(|p| p.is_match(url.as_str()))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }
}
