//! URL helpers shared by the transport, the strategies and pagination.

use url::Url;
use webclip_core::Error;

/// Parse the entry URL of a crawl.
///
/// Surrounding whitespace is trimmed, a missing scheme defaults to `https`,
/// the host is lowercased and the fragment dropped. The query is kept as is.
pub fn canonicalize(input: &str) -> Result<Url, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let mut parsed = Url::parse(&with_scheme).map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!("unsupported scheme: {}", parsed.scheme())));
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    }
    parsed.set_fragment(None);

    Ok(parsed)
}

/// The URL with query string and fragment removed.
pub fn resource_base(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    base
}

/// Host with any leading `www.` removed, lowercased.
pub fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Whether the URL's host is `domain` or one of its subdomains.
pub fn host_is(url: &Url, domain: &str) -> bool {
    bare_host(url).is_some_and(|host| host == domain || host.ends_with(&format!(".{domain}")))
}
