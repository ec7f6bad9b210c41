use std::path::PathBuf;

/// Errors that can occur anywhere in the review bot.
///
/// Library crates return this type directly; the binary converts it into a
/// `miette` report at the boundary.
///
/// # Examples
///
/// ```
/// use lookout_core::LookoutError;
///
/// let err = LookoutError::Config("missing webhook secret".into());
/// assert!(err.to_string().contains("missing webhook secret"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LookoutError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(lookout::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(lookout::config),
        help("check lookout.toml and the LOOKOUT_* environment variables")
    )]
    Config(String),

    /// Malformed inbound data (webhook payloads, API responses).
    #[error("parse error: {0}")]
    #[diagnostic(code(lookout::parse))]
    Parse(String),

    /// LLM transport or response error.
    #[error("LLM error: {0}")]
    #[diagnostic(code(lookout::llm))]
    Llm(String),

    /// Hosting-platform API failure.
    #[error("GitHub error: {0}")]
    #[diagnostic(code(lookout::github))]
    GitHub(String),

    /// Token signing or key loading failure.
    #[error("authentication error: {0}")]
    #[diagnostic(code(lookout::auth))]
    Auth(String),

    /// A heuristic rule failed on one chunk.
    #[error("rule {rule} failed: {message}")]
    #[diagnostic(code(lookout::rule))]
    Rule {
        /// Name of the failing rule.
        rule: String,
        /// What went wrong.
        message: String,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(lookout::serde))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(lookout::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(lookout::file_not_found))]
    FileNotFound(PathBuf),
}
