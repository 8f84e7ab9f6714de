//! Core types and shared functionality for webclip.
//!
//! This crate provides:
//! - Unified error types
//! - Layered configuration
//! - Site profiles and wildcard URL patterns

pub mod config;
pub mod error;
pub mod pattern;
pub mod profile;

pub use config::{AppConfig, ClipSettings, ConfigError};
pub use error::Error;
pub use pattern::{Pattern, PatternError, matches};
pub use profile::{SiteProfile, resolve_profile};
