use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LookoutError;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lookout.toml";

/// Top-level configuration loaded from `lookout.toml`.
///
/// Resolution order: `LOOKOUT_*` environment variables > config file > defaults.
///
/// # Examples
///
/// ```
/// use lookout_core::BotConfig;
///
/// let config = BotConfig::default();
/// assert_eq!(config.llm.timeout_seconds, 60);
/// assert!(config.app.heuristics_enabled);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Hosting-platform settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Review pipeline switches and limits.
    #[serde(default)]
    pub app: AppConfig,
    /// Webhook listener settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl BotConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::FileNotFound`] if the file does not exist,
    /// [`LookoutError::Io`] if it cannot be read, or [`LookoutError::Toml`]
    /// if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, LookoutError> {
        if !path.exists() {
            return Err(LookoutError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use lookout_core::BotConfig;
    ///
    /// let toml = r#"
    /// [app]
    /// llm_enabled = false
    /// "#;
    /// let config = BotConfig::from_toml(toml).unwrap();
    /// assert!(!config.app.llm_enabled);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, LookoutError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the effective configuration.
    ///
    /// Reads `path` when given, otherwise [`DEFAULT_CONFIG_FILE`] if present,
    /// otherwise defaults; then applies `LOOKOUT_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Propagates file, TOML and override errors.
    pub fn load(path: Option<&Path>) -> Result<Self, LookoutError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `LOOKOUT_*` overrides using `lookup` to read variables.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Config`] if a numeric or boolean override
    /// cannot be parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use lookout_core::BotConfig;
    ///
    /// let mut config = BotConfig::default();
    /// config
    ///     .apply_env_overrides(|key| match key {
    ///         "LOOKOUT_LLM_MODEL" => Some("llama3".to_string()),
    ///         _ => None,
    ///     })
    ///     .unwrap();
    /// assert_eq!(config.llm.model, "llama3");
    /// ```
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), LookoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOOKOUT_GITHUB_APP_ID") {
            self.github.app.id = Some(parse_override("LOOKOUT_GITHUB_APP_ID", &v)?);
        }
        if let Some(v) = lookup("LOOKOUT_GITHUB_CLIENT_ID") {
            self.github.app.client_id = Some(v);
        }
        if let Some(v) = lookup("LOOKOUT_GITHUB_PRIVATE_KEY_PATH") {
            self.github.app.private_key_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("LOOKOUT_GITHUB_WEBHOOK_SECRET") {
            self.github.app.webhook_secret = Some(v);
        }
        if let Some(v) = lookup("LOOKOUT_GITHUB_API_URL") {
            self.github.api_url = v;
        }
        if let Some(v) = lookup("LOOKOUT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("LOOKOUT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("LOOKOUT_LLM_TIMEOUT_SECONDS") {
            self.llm.timeout_seconds = parse_override("LOOKOUT_LLM_TIMEOUT_SECONDS", &v)?;
        }
        if let Some(v) = lookup("LOOKOUT_LLM_ENABLED") {
            self.llm.enabled = parse_override("LOOKOUT_LLM_ENABLED", &v)?;
        }
        if let Some(v) = lookup("LOOKOUT_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        Ok(())
    }

    /// Check that everything the webhook server needs is present.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Config`] naming the first missing setting.
    pub fn validate_for_server(&self) -> Result<(), LookoutError> {
        let app = &self.github.app;
        if app.webhook_secret.as_deref().is_none_or(str::is_empty) {
            return Err(LookoutError::Config(
                "github.app.webhook_secret is not set".into(),
            ));
        }
        if app.id.is_none() {
            return Err(LookoutError::Config("github.app.id is not set".into()));
        }
        if app.private_key_path.is_none() {
            return Err(LookoutError::Config(
                "github.app.private_key_path is not set".into(),
            ));
        }
        Ok(())
    }

    /// Whether the LLM branch of the pipeline should run.
    pub fn llm_branch_enabled(&self) -> bool {
        self.app.llm_enabled && self.llm.enabled
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, LookoutError> {
    value
        .trim()
        .parse()
        .map_err(|_| LookoutError::Config(format!("invalid value for {key}: {value:?}")))
}

/// Hosting-platform configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root (default: `https://api.github.com`).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// GitHub App credentials.
    #[serde(default)]
    pub app: GitHubAppConfig,
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            app: GitHubAppConfig::default(),
        }
    }
}

/// GitHub App identity and secrets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubAppConfig {
    /// Numeric app id, used as the JWT issuer.
    pub id: Option<u64>,
    /// OAuth client id of the app.
    pub client_id: Option<String>,
    /// PEM file holding the app's RSA private key.
    pub private_key_path: Option<PathBuf>,
    /// Shared secret for webhook signatures.
    pub webhook_secret: Option<String>,
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use lookout_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "qwen2.5-coder:7b");
/// assert_eq!(config.base_url, "http://localhost:11434");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Root URL of the generation API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Master switch for the LLM client.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_model() -> String {
    "qwen2.5-coder:7b".into()
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            enabled: true,
        }
    }
}

/// Pipeline switches and size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Diffs larger than this are not reviewed (default: 1 MiB).
    #[serde(default = "default_max_diff_size_bytes")]
    pub max_diff_size_bytes: u64,
    /// Maximum number of distinct files analysed per PR (default: 50).
    #[serde(default = "default_max_files_per_pr")]
    pub max_files_per_pr: usize,
    /// Run the pattern-based rules.
    #[serde(default = "default_true")]
    pub heuristics_enabled: bool,
    /// Run the LLM reviewer.
    #[serde(default = "default_true")]
    pub llm_enabled: bool,
    /// Delete earlier bot summaries before publishing a new one.
    #[serde(default)]
    pub enable_comment_deletion: bool,
}

fn default_max_diff_size_bytes() -> u64 {
    1_048_576
}

fn default_max_files_per_pr() -> usize {
    50
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_diff_size_bytes: default_max_diff_size_bytes(),
            max_files_per_pr: default_max_files_per_pr(),
            heuristics_enabled: true,
            llm_enabled: true,
            enable_comment_deletion: false,
        }
    }
}

/// Webhook listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (default: `0.0.0.0:8080`).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}
