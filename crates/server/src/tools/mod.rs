//! MCP tool implementations.
//!
//! This module contains all tools exposed by the webclip server.

pub mod clip_html;
pub mod web_clip;

pub use clip_html::{ClipHtmlParams, clip_html_impl};
pub use web_clip::{WebClipParams, clip_impl};
