//! Wildcard URL patterns.
//!
//! Site profiles and the rendering allow-list are written as wildcard strings
//! such as `https://example.com/*`. Every character except `*` is literal and
//! `*` matches any run of characters. Matching is case-insensitive, anchored at
//! both ends, and tolerates an optional leading `www.` on the host of either
//! the pattern or the URL.

use regex::{Regex, RegexBuilder};

/// Error type for wildcard patterns that cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("invalid pattern {pattern:?}: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    strict: Regex,
    relaxed: Regex,
}

impl Pattern {
    /// Compile a wildcard pattern.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(PatternError::Empty);
        }

        let strict = build_regex(trimmed)?;
        let relaxed = build_regex(&strip_www(trimmed))?;

        Ok(Self { raw: trimmed.to_string(), strict, relaxed })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check a URL against the pattern.
    ///
    /// The strict form is tried first; on failure both sides are retried with
    /// any leading `www.` removed from the host.
    pub fn is_match(&self, url: &str) -> bool {
        self.strict.is_match(url) || self.relaxed.is_match(&strip_www(url))
    }
}

/// Check `url` against a wildcard `pattern`.
///
/// Malformed patterns never match.
pub fn matches(url: &str, pattern: &str) -> bool {
    match Pattern::compile(pattern) {
        Ok(compiled) => compiled.is_match(url),
        Err(e) => {
            tracing::debug!(pattern, "skipping pattern: {e}");
            false
        }
    }
}

fn build_regex(pattern: &str) -> Result<Regex, PatternError> {
    let body = pattern.split('*').map(regex::escape).collect::<Vec<_>>().join(".*");

    RegexBuilder::new(&format!("^{body}$"))
        .case_insensitive(true)
        .build()
        .map_err(|source| PatternError::Invalid { pattern: pattern.to_string(), source })
}

/// Remove a leading `www.` from the host part of a URL or pattern.
fn strip_www(s: &str) -> String {
    let (prefix, rest) = match s.find("://") {
        Some(idx) => s.split_at(idx + 3),
        None => ("", s),
    };

    if rest.get(..4).is_some_and(|head| head.eq_ignore_ascii_case("www.")) {
        format!("{prefix}{}", &rest[4..])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matches_path() {
        assert!(matches("https://example.com/a", "https://example.com/*"));
        assert!(matches("https://example.com/a/b?c=d", "https://example.com/*"));
        assert!(!matches("https://other.com/a", "https://example.com/*"));
    }

    #[test]
    fn test_www_tolerance_both_directions() {
        assert!(matches("https://www.example.com/a", "https://example.com/*"));
        assert!(matches("https://example.com/a", "https://www.example.com/*"));
        assert!(!matches("https://wwwexample.com/a", "https://example.com/*"));
    }

    #[test]
    fn test_literal_pattern_is_case_insensitive_equality() {
        let cases = [
            ("https://example.com/post", "https://example.com/post", true),
            ("https://EXAMPLE.com/Post", "https://example.com/post", true),
            ("https://example.com/post", "https://example.com/posts", false),
            ("https://example.com/posts", "https://example.com/post", false),
            ("http://example.com/post", "https://example.com/post", false),
        ];

        for (url, pattern, expected) in cases {
            assert_eq!(matches(url, pattern), expected, "{url} vs {pattern}");
        }
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("https://example.com/a+b(c)", "https://example.com/a+b(c)"));
        assert!(!matches("https://exampleXcom/", "https://example.com/"));
        assert!(matches("https://example.com/?q=[1]", "https://example.com/?q=*"));
    }

    #[test]
    fn test_anchored_at_both_ends() {
        assert!(!matches("xhttps://example.com/a", "https://example.com/*"));
        assert!(!matches("https://example.com/a", "https://example.com/"));
    }

    #[test]
    fn test_multiple_wildcards() {
        assert!(matches("https://x.com/someone/status/123", "https://x.com/*/status/*"));
        assert!(!matches("https://x.com/someone/likes", "https://x.com/*/status/*"));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        assert!(matches!(Pattern::compile("   "), Err(PatternError::Empty)));
        assert!(!matches("https://example.com/", ""));
    }

    #[test]
    fn test_strip_www() {
        assert_eq!(strip_www("https://www.example.com/"), "https://example.com/");
        assert_eq!(strip_www("https://WWW.example.com/"), "https://example.com/");
        assert_eq!(strip_www("www.example.com"), "example.com");
        assert_eq!(strip_www("https://example.com/www."), "https://example.com/www.");
        assert_eq!(strip_www("https://ww"), "https://ww");
    }

    #[test]
    fn test_compiled_pattern_keeps_source() {
        let pattern = Pattern::compile(" https://example.com/* ").unwrap();
        assert_eq!(pattern.as_str(), "https://example.com/*");
    }
}
