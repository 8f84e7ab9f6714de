//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WEBCLIP_*)
//! 2. TOML config file (if WEBCLIP_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::profile::SiteProfile;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WEBCLIP_*)
/// 2. TOML config file (if WEBCLIP_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ordered per-site login profiles. The first match wins.
    #[serde(default)]
    pub site_profiles: Vec<SiteProfile>,

    /// Manual proxy override, e.g. `http://127.0.0.1:7890` or `socks5://127.0.0.1:1080`.
    ///
    /// Set via WEBCLIP_PROXY_URL environment variable.
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Ask the host platform which proxy it would use for a URL.
    ///
    /// Set via WEBCLIP_USE_PLATFORM_PROXY environment variable.
    #[serde(default = "default_true")]
    pub use_platform_proxy: bool,

    /// The platform's proxy answer in PAC form: `PROXY host:port`,
    /// `SOCKS5 host:port` or `DIRECT`. Hosts export their system proxy here.
    ///
    /// Set via WEBCLIP_PLATFORM_PROXY environment variable.
    #[serde(default)]
    pub platform_proxy: Option<String>,

    /// Append forum replies to the clipped document.
    ///
    /// Set via WEBCLIP_INCLUDE_REPLIES environment variable.
    #[serde(default = "default_true")]
    pub include_replies: bool,

    /// Where the host stores clipped notes. Not read by the pipeline.
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,

    /// Default User-Agent when no site profile overrides it.
    ///
    /// Set via WEBCLIP_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language header for direct fetches.
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Timeout for each direct fetch and redirect hop, in milliseconds.
    ///
    /// Set via WEBCLIP_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Timeout for a delegated render, in milliseconds.
    ///
    /// Set via WEBCLIP_RENDER_TIMEOUT_MS environment variable.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Maximum number of redirects followed per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Maximum response body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Base URL of the rendering service.
    ///
    /// Set via WEBCLIP_RENDER_SERVICE_URL environment variable.
    #[serde(default = "default_render_service_url")]
    pub render_service_url: String,

    /// Wildcard patterns of sites that only produce content after client-side scripts run.
    #[serde(default = "default_render_sites")]
    pub render_sites: Vec<String>,

    /// Pause between consecutive pagination fetches, in milliseconds.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Upper bound on the number of pages aggregated for one thread.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_true() -> bool {
    true
}

fn default_save_path() -> PathBuf {
    PathBuf::from("WebClips")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .into()
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9,en;q=0.8".into()
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_render_timeout_ms() -> u64 {
    90_000
}

fn default_max_redirects() -> usize {
    10
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_render_service_url() -> String {
    "http://127.0.0.1:3737".into()
}

fn default_render_sites() -> Vec<String> {
    vec![
        "https://x.com/*/status/*".into(),
        "https://twitter.com/*/status/*".into(),
        "https://www.zhihu.com/question/*".into(),
        "https://zhuanlan.zhihu.com/p/*".into(),
    ]
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_max_pages() -> usize {
    20
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_profiles: Vec::new(),
            proxy_url: None,
            use_platform_proxy: true,
            platform_proxy: None,
            include_replies: true,
            save_path: default_save_path(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            timeout_ms: default_timeout_ms(),
            render_timeout_ms: default_render_timeout_ms(),
            max_redirects: default_max_redirects(),
            max_bytes: default_max_bytes(),
            render_service_url: default_render_service_url(),
            render_sites: default_render_sites(),
            page_delay_ms: default_page_delay_ms(),
            max_pages: default_max_pages(),
        }
    }
}

/// Per-call settings handed to the crawl entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipSettings {
    /// Manual proxy override; wins over every other source when non-empty.
    pub proxy_url: Option<String>,
    /// Consult the platform proxy resolver.
    pub use_platform_proxy: bool,
    /// Append forum replies to the document.
    pub include_replies: bool,
}

impl ClipSettings {
    /// The manual proxy, if set to something other than whitespace.
    pub fn manual_proxy(&self) -> Option<&str> {
        self.proxy_url.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Per-call settings derived from this configuration.
    pub fn settings(&self) -> ClipSettings {
        ClipSettings {
            proxy_url: self.proxy_url.clone(),
            use_platform_proxy: self.use_platform_proxy,
            include_replies: self.include_replies,
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WEBCLIP_`
    /// 2. TOML file from `WEBCLIP_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WEBCLIP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WEBCLIP_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
