use std::time::Duration;

use async_trait::async_trait;
use lookout_core::{LlmConfig, LookoutError};

/// Bound on the liveness probe, independent of the generation timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Text-generation backend used by the LLM review engine.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use lookout_core::LookoutError;
/// use lookout_review::llm::LlmClient;
///
/// struct Echo;
///
/// #[async_trait]
/// impl LlmClient for Echo {
///     async fn generate(&self, prompt: &str) -> Result<String, LookoutError> {
///         Ok(prompt.to_string())
///     }
///     fn model(&self) -> &str {
///         "echo"
///     }
/// }
/// ```
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` and return the model's free-form reply.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Llm`] on transport errors, timeouts, non-2xx
    /// statuses or unexpected response bodies.
    async fn generate(&self, prompt: &str) -> Result<String, LookoutError>;

    /// Model identifier reported in review stats.
    fn model(&self) -> &str;
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
///
/// # Examples
///
/// ```
/// use lookout_core::LlmConfig;
/// use lookout_review::llm::{LlmClient, OllamaClient};
///
/// let client = OllamaClient::new(&LlmConfig::default()).unwrap();
/// assert_eq!(client.model(), "qwen2.5-coder:7b");
/// ```
pub struct OllamaClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OllamaClient {
    /// Create a client whose requests time out after `timeout_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, LookoutError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LookoutError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Probe `GET {base_url}/api/tags`; any failure means unavailable.
    pub async fn is_available(&self) -> bool {
        let result = self
            .client
            .get(self.url("/api/tags"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "LLM liveness probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, LookoutError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "temperature": 0.7,
        });

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| LookoutError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(LookoutError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LookoutError::Llm(format!("failed to parse response: {e}")))?;

        extract_response(&response_body)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn extract_response(body: &serde_json::Value) -> Result<String, LookoutError> {
    body.get("response")
        .and_then(|r| r.as_str())
        .map(str::to_string)
        .ok_or_else(|| LookoutError::Llm(format!("unexpected response structure: {body}")))
}
