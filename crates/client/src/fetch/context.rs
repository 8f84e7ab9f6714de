//! Per-request network context: proxy plus outbound headers.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use webclip_core::SiteProfile;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Header defaults applied when no site profile overrides them.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub user_agent: String,
    pub accept_language: String,
}

/// Proxy and headers for one crawl. Built fresh for every call.
#[derive(Debug, Clone, Default)]
pub struct ResolvedContext {
    pub proxy_url: Option<String>,
    pub headers: HeaderMap,
}

impl ResolvedContext {
    /// Combine the resolved proxy with headers from the matched profile.
    pub fn new(proxy_url: Option<String>, profile: Option<&SiteProfile>, defaults: &RequestDefaults) -> Self {
        let mut headers = HeaderMap::new();

        let user_agent = profile.and_then(SiteProfile::user_agent).unwrap_or(defaults.user_agent.as_str());
        insert(&mut headers, header::USER_AGENT, user_agent);
        insert(&mut headers, header::ACCEPT, ACCEPT_HTML);
        insert(&mut headers, header::ACCEPT_LANGUAGE, &defaults.accept_language);
        insert(&mut headers, header::UPGRADE_INSECURE_REQUESTS, "1");

        if let Some(cookies) = profile.and_then(SiteProfile::cookies) {
            insert(&mut headers, header::COOKIE, cookies);
        }

        Self { proxy_url, headers }
    }

    /// Cookie header value, forwarded to the rendering service.
    pub fn cookies(&self) -> Option<&str> {
        self.headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok())
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(e) => tracing::warn!(header = %name, "dropping header with invalid value: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> RequestDefaults {
        RequestDefaults { user_agent: "default-agent".into(), accept_language: "en".into() }
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = ResolvedContext::new(None, None, &defaults());
        assert_eq!(ctx.user_agent(), Some("default-agent"));
        assert_eq!(ctx.cookies(), None);
        assert!(ctx.headers.contains_key(header::ACCEPT));
        assert_eq!(ctx.headers.get(header::ACCEPT_LANGUAGE).unwrap(), "en");
        assert!(ctx.proxy_url.is_none());
    }

    #[test]
    fn test_profile_overrides() {
        let profile = SiteProfile {
            url_pattern: "https://example.com/*".into(),
            cookies: Some("session=abc; theme=dark".into()),
            user_agent: Some("profile-agent".into()),
        };

        let ctx = ResolvedContext::new(Some("http://127.0.0.1:7890".into()), Some(&profile), &defaults());
        assert_eq!(ctx.user_agent(), Some("profile-agent"));
        assert_eq!(ctx.cookies(), Some("session=abc; theme=dark"));
        assert_eq!(ctx.proxy_url.as_deref(), Some("http://127.0.0.1:7890"));
    }

    #[test]
    fn test_invalid_cookie_value_is_dropped() {
        let profile = SiteProfile {
            url_pattern: "https://example.com/*".into(),
            cookies: Some("bad\nvalue".into()),
            user_agent: None,
        };

        let ctx = ResolvedContext::new(None, Some(&profile), &defaults());
        assert_eq!(ctx.cookies(), None);
        assert_eq!(ctx.user_agent(), Some("default-agent"));
    }
}
