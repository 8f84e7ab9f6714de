//! Per-site login profiles and their lookup.

use serde::{Deserialize, Serialize};

use crate::pattern::matches;

/// Cookies and User-Agent to send for URLs matching `url_pattern`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Wildcard URL pattern, e.g. `https://example.com/*`.
    pub url_pattern: String,

    /// Raw `Cookie` header value (`key1=value1; key2=value2`).
    #[serde(default)]
    pub cookies: Option<String>,

    /// User-Agent override.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl SiteProfile {
    pub fn new(url_pattern: impl Into<String>) -> Self {
        Self { url_pattern: url_pattern.into(), ..Default::default() }
    }

    pub fn with_cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Cookie header value, if one is configured and non-blank.
    pub fn cookies(&self) -> Option<&str> {
        self.cookies.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// User-Agent override, if one is configured and non-blank.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref().map(str::trim).filter(|ua| !ua.is_empty())
    }
}

/// Select the first profile, in configured order, whose pattern matches `url`.
///
/// Profiles with malformed patterns are skipped. `None` means the request goes
/// out anonymously.
pub fn resolve_profile<'a>(url: &str, profiles: &'a [SiteProfile]) -> Option<&'a SiteProfile> {
    let found = profiles.iter().find(|profile| matches(url, &profile.url_pattern));

    if let Some(profile) = found {
        tracing::debug!(url, pattern = %profile.url_pattern, "matched site profile");
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(pattern: &str, cookies: &str) -> SiteProfile {
        SiteProfile { url_pattern: pattern.into(), cookies: Some(cookies.into()), user_agent: None }
    }

    #[test]
    fn test_first_match_wins() {
        let profiles = vec![
            profile("https://other.com/*", "a=1"),
            profile("https://example.com/*", "b=2"),
            profile("https://example.com/post", "c=3"),
        ];

        let found = resolve_profile("https://example.com/post", &profiles).unwrap();
        assert_eq!(found.cookies(), Some("b=2"));
    }

    #[test]
    fn test_no_match_is_none() {
        let profiles = vec![profile("https://other.com/*", "a=1")];
        assert!(resolve_profile("https://example.com/post", &profiles).is_none());
        assert!(resolve_profile("https://example.com/post", &[]).is_none());
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let profiles = vec![profile("", "a=1"), profile("https://example.com/*", "b=2")];
        let found = resolve_profile("https://example.com/post", &profiles).unwrap();
        assert_eq!(found.cookies(), Some("b=2"));
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let profile = SiteProfile {
            url_pattern: "https://example.com/*".into(),
            cookies: Some("  ".into()),
            user_agent: Some(String::new()),
        };
        assert_eq!(profile.cookies(), None);
        assert_eq!(profile.user_agent(), None);
    }
}
