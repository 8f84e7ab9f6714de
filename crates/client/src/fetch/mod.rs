//! HTTP transport.
//!
//! ### Contract
//! Every transport turns `(url, resolved context)` into page HTML. The direct
//! transport below talks to the origin; the rendering service client in
//! [`crate::render`] is the delegated one.
//!
//! ### Direct fetch
//! - Proxy from the resolved context (HTTP, HTTPS or SOCKS); no proxy means a
//!   direct connection, environment proxies are not picked up implicitly.
//!   An unusable proxy fails the fetch instead of bypassing it.
//! - Self-signed certificates are accepted.
//! - Redirects (301/302/307/308) are followed by hand, relative `Location`
//!   values resolved against the current URL, at most `max_redirects` hops.
//! - Each hop has its own timeout (default: 60s).
//! - Status >= 400 is an error carrying the status code.
//! - Max body bytes: 10MB (configurable)

pub mod context;
pub mod proxy;
pub mod url;

use reqwest::{Client, Proxy, StatusCode, header};
use std::time::{Duration, Instant};
use webclip_core::{AppConfig, Error};

pub use context::{RequestDefaults, ResolvedContext};
pub use proxy::{NoPlatformProxy, PacProxyResolver, PlatformProxyResolver, ProxyResolver, ProxySource};
pub use url::canonicalize;

use ::url::Url;

/// Fetches page HTML for a URL.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &Url, context: &ResolvedContext) -> Result<String, Error>;
}

/// Configuration for the direct fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout per request, redirect hops included (default: 60s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(60), max_redirects: 10, max_bytes: 10 * 1024 * 1024 }
    }
}

impl FetchConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self { timeout: config.timeout(), max_redirects: config.max_redirects, max_bytes: config.max_bytes }
    }
}

/// Response from a direct fetch.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The URL that produced the body, after redirects
    pub final_url: Url,
    /// HTTP status code of the final response
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body decoded as UTF-8 (lossy)
    pub html: String,
    /// Number of redirects followed
    pub redirects: usize,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Direct HTTP(S) transport.
#[derive(Debug, Clone, Default)]
pub struct FetchClient {
    config: FetchConfig,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn client_for(&self, context: &ResolvedContext) -> Result<Client, Error> {
        let mut builder = Client::builder()
            .timeout(self.config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .danger_accept_invalid_certs(true)
            .gzip(true)
            .brotli(true)
            .deflate(true);

        builder = match context.proxy_url.as_deref().map(Proxy::all) {
            Some(Ok(proxy)) => builder.proxy(proxy),
            Some(Err(e)) => {
                let proxy = context.proxy_url.as_deref().unwrap_or_default();
                return Err(Error::Network(format!("unusable proxy {proxy}: {e}")));
            }
            None => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))
    }

    /// Fetch a URL, following redirects up to the configured bound.
    pub async fn fetch_page(&self, url: &Url, context: &ResolvedContext) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let client = self.client_for(context)?;
        let mut current = url.clone();

        for hop in 0..=self.config.max_redirects {
            let response = client
                .get(current.as_str())
                .headers(context.headers.clone())
                .send()
                .await
                .map_err(|e| self.classify(e, &current))?;

            let status = response.status();

            if is_followed_redirect(status)
                && let Some(location) = response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
            {
                let next = current
                    .join(location)
                    .map_err(|e| Error::InvalidUrl(format!("bad redirect target {location:?}: {e}")))?;
                tracing::debug!(hop, from = %current, to = %next, status = status.as_u16(), "following redirect");
                current = next;
                continue;
            }

            if status.as_u16() >= 400 {
                return Err(Error::HttpStatus { status: status.as_u16(), url: current.to_string() });
            }

            if let Some(len) = response.content_length()
                && len as usize > self.config.max_bytes
            {
                return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
            }

            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            let bytes = response.bytes().await.map_err(|e| self.classify(e, &current))?;

            if bytes.len() > self.config.max_bytes {
                return Err(Error::FetchTooLarge(format!(
                    "{} bytes exceeds {}",
                    bytes.len(),
                    self.config.max_bytes
                )));
            }

            let fetch_ms = start.elapsed().as_millis() as u64;

            tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, current, fetch_ms, bytes.len());

            return Ok(FetchResponse {
                url: url.clone(),
                final_url: current,
                status,
                content_type,
                html: String::from_utf8_lossy(&bytes).into_owned(),
                redirects: hop,
                fetch_ms,
            });
        }

        Err(Error::TooManyRedirects { limit: self.config.max_redirects, url: url.to_string() })
    }

    fn classify(&self, err: reqwest::Error, url: &Url) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(format!("{url} did not answer within {}ms", self.config.timeout.as_millis()))
        } else {
            Error::Network(format!("{url}: {err}"))
        }
    }
}

#[async_trait::async_trait]
impl Transport for FetchClient {
    async fn fetch(&self, url: &Url, context: &ResolvedContext) -> Result<String, Error> {
        self.fetch_page(url, context).await.map(|response| response.html)
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}
