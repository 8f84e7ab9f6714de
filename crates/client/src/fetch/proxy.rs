//! Outbound proxy resolution.
//!
//! Sources are consulted in a fixed order and the first hit wins:
//!
//! 1. The manual proxy from the call settings.
//! 2. The platform proxy resolver, when the settings enable it.
//! 3. `HTTP_PROXY` / `HTTPS_PROXY` environment variables (any case).
//! 4. No proxy: the request goes out directly.

use std::sync::Arc;

use url::Url;
use webclip_core::{AppConfig, ClipSettings};

/// Host capability that reports the proxy the platform would use for a URL.
pub trait PlatformProxyResolver: Send + Sync {
    /// Proxy URL for `target`, or `None` for a direct connection.
    fn resolve(&self, target: &Url) -> Option<String>;
}

impl<F> PlatformProxyResolver for F
where
    F: Fn(&Url) -> Option<String> + Send + Sync,
{
    fn resolve(&self, target: &Url) -> Option<String> {
        self(target)
    }
}

/// Platform resolver for hosts without one. Always direct.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlatformProxy;

impl PlatformProxyResolver for NoPlatformProxy {
    fn resolve(&self, _target: &Url) -> Option<String> {
        None
    }
}

/// Adapter for host runtimes that answer in PAC form (`"PROXY host:port; DIRECT"`).
pub struct PacProxyResolver<F> {
    lookup: F,
}

impl<F> PacProxyResolver<F>
where
    F: Fn(&Url) -> Option<String> + Send + Sync,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

impl<F> PlatformProxyResolver for PacProxyResolver<F>
where
    F: Fn(&Url) -> Option<String> + Send + Sync,
{
    fn resolve(&self, target: &Url) -> Option<String> {
        (self.lookup)(target).and_then(|answer| parse_pac_directive(&answer))
    }
}

/// Convert the first usable PAC directive into a proxy URL.
///
/// `DIRECT` before any proxy entry means no proxy.
pub fn parse_pac_directive(answer: &str) -> Option<String> {
    for entry in answer.split(';') {
        let mut parts = entry.split_whitespace();
        let Some(kind) = parts.next() else { continue };
        let host = parts.next();

        match (kind.to_ascii_uppercase().as_str(), host) {
            ("DIRECT", _) => return None,
            ("PROXY" | "HTTP", Some(host)) => return Some(format!("http://{host}")),
            ("HTTPS", Some(host)) => return Some(format!("https://{host}")),
            ("SOCKS" | "SOCKS5", Some(host)) => return Some(format!("socks5://{host}")),
            ("SOCKS4", Some(host)) => return Some(format!("socks4://{host}")),
            _ => continue,
        }
    }
    None
}

/// Where the resolved proxy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxySource {
    Manual,
    Platform,
    Environment,
}

#[derive(Debug, Clone)]
enum EnvSource {
    Process,
    Fixed(Vec<(String, String)>),
}

/// Resolves the proxy for each request. Nothing is cached between calls.
#[derive(Clone)]
pub struct ProxyResolver {
    platform: Arc<dyn PlatformProxyResolver>,
    env: EnvSource,
}

impl Default for ProxyResolver {
    fn default() -> Self {
        Self::new(Arc::new(NoPlatformProxy))
    }
}

impl ProxyResolver {
    pub fn new(platform: Arc<dyn PlatformProxyResolver>) -> Self {
        Self { platform, env: EnvSource::Process }
    }

    /// Platform step driven by the configured PAC answer, if any.
    pub fn from_app(config: &AppConfig) -> Self {
        let Some(answer) = config.platform_proxy.as_deref().map(str::trim).filter(|a| !a.is_empty()) else {
            return Self::default();
        };

        let answer = answer.to_string();
        if parse_pac_directive(&answer).is_none() {
            tracing::debug!(%answer, "platform proxy answer resolves to a direct connection");
        }

        Self::new(Arc::new(PacProxyResolver::new(move |_: &Url| Some(answer.clone()))))
    }

    /// Read proxy variables from a fixed set instead of the process environment.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = EnvSource::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Proxy URL for `target`, or `None` for a direct connection.
    pub fn resolve(&self, target: &Url, settings: &ClipSettings) -> Option<String> {
        match self.resolve_with_source(target, settings) {
            Some((proxy, source)) => {
                tracing::info!(target = %target, proxy = %proxy, ?source, "using proxy");
                Some(proxy)
            }
            None => {
                tracing::warn!(target = %target, "no proxy configured; connecting directly");
                None
            }
        }
    }

    pub fn resolve_with_source(&self, target: &Url, settings: &ClipSettings) -> Option<(String, ProxySource)> {
        if let Some(manual) = settings.manual_proxy() {
            return Some((manual.to_string(), ProxySource::Manual));
        }

        if settings.use_platform_proxy
            && let Some(platform) = self.platform.resolve(target).filter(|p| !p.trim().is_empty())
        {
            return Some((platform.trim().to_string(), ProxySource::Platform));
        }

        self.env_proxy(target).map(|p| (p, ProxySource::Environment))
    }

    fn env_proxy(&self, target: &Url) -> Option<String> {
        let vars: Vec<(String, String)> = match &self.env {
            EnvSource::Process => std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
            EnvSource::Fixed(vars) => vars.clone(),
        };

        let order = if target.scheme() == "https" { ["HTTPS_PROXY", "HTTP_PROXY"] } else { ["HTTP_PROXY", "HTTPS_PROXY"] };

        order.iter().find_map(|name| {
            vars.iter()
                .find(|(key, value)| key.eq_ignore_ascii_case(name) && !value.trim().is_empty())
                .map(|(_, value)| value.trim().to_string())
        })
    }
}
