//! Core types, configuration, and error handling for the lookout review bot.
//!
//! This crate provides the shared foundation used by all other lookout crates:
//! - [`LookoutError`]: unified error type using `thiserror`
//! - [`BotConfig`]: configuration loaded from `lookout.toml` plus `LOOKOUT_*` overrides
//! - Shared types: [`ChangeChunk`], [`Finding`], [`PullRequestContext`], [`Severity`],
//!   [`ChangeType`], [`FindingSource`]

mod config;
mod error;
mod types;

pub use config::{
    AppConfig, BotConfig, GitHubAppConfig, GitHubConfig, LlmConfig, ServerConfig,
    DEFAULT_CONFIG_FILE,
};
pub use error::LookoutError;
pub use types::{
    ChangeChunk, ChangeType, Finding, FindingSource, PullRequestContext, Severity, CODE_REVIEW,
    POTENTIAL_BUG, SECURITY,
};

/// A convenience `Result` type for lookout operations.
pub type Result<T> = std::result::Result<T, LookoutError>;
