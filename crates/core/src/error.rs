//! Unified error types for webclip.
//!
//! Every message starts with a stable code so hosts can branch on it without
//! parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error type surfaced by the crawl pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty HTML).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The origin answered with a status >= 400.
    #[error("HTTP_ERROR: status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// A network operation exceeded its deadline.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// The redirect chain was longer than the configured bound.
    #[error("TOO_MANY_REDIRECTS: more than {limit} redirects starting at {url}")]
    TooManyRedirects { limit: usize, url: String },

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Connection, TLS or body read failure.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// The rendering service could not be reached.
    #[error("RENDER_UNAVAILABLE: {0}")]
    RenderServiceUnavailable(String),

    /// The rendering service answered but did not produce HTML.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),

    /// HTML to Markdown conversion failed.
    #[error("CONVERT_FAILED: {0}")]
    ConvertFailed(String),
}

impl Error {
    /// HTTP status carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::FetchTimeout(_))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::ConvertFailed(_) => -32000,
            Error::InvalidUrl(_) => -32003,
            Error::FetchTimeout(_) => -32006,
            Error::FetchTooLarge(_) => -32007,
            Error::HttpStatus { .. } | Error::Network(_) => -32008,
            Error::TooManyRedirects { .. } => -32009,
            Error::RenderServiceUnavailable(_) => -32011,
            Error::RenderFailed(_) => -32012,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
