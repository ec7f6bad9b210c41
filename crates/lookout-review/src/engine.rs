use std::sync::Arc;

use futures::future::join_all;
use lookout_core::{ChangeChunk, Finding, PullRequestContext};

use crate::llm::LlmClient;
use crate::prompt::{build_review_prompt, classify_response};

/// Reviews chunks with an LLM, one request per chunk.
///
/// All requests are in flight at once; the HTTP client's pool is the only
/// bound. A failed chunk contributes nothing and is logged.
#[derive(Clone)]
pub struct LlmReviewEngine {
    client: Arc<dyn LlmClient>,
}

impl LlmReviewEngine {
    /// Engine sending one prompt per chunk to `client`.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Model identifier of the underlying client.
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Review every chunk and collect the classified findings in chunk order.
    pub async fn analyze_with_llm(
        &self,
        pr: &PullRequestContext,
        chunks: &[ChangeChunk],
    ) -> Vec<Finding> {
        let reviews = chunks.iter().map(|chunk| self.analyze_chunk(pr, chunk));
        join_all(reviews).await.into_iter().flatten().collect()
    }

    async fn analyze_chunk(&self, pr: &PullRequestContext, chunk: &ChangeChunk) -> Vec<Finding> {
        let prompt = build_review_prompt(chunk, pr);
        match self.client.generate(&prompt).await {
            Ok(response) => classify_response(&response, chunk),
            Err(e) => {
                tracing::warn!(file = %chunk.file_path, error = %e, "LLM review failed for chunk");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use lookout_core::{ChangeType, LookoutError, Severity};

    use super::*;

    /// Answers per file path; `fail.rs` errors.
    struct ScriptedClient;

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn generate(&self, prompt: &str) -> Result<String, LookoutError> {
            if prompt.contains("File: fail.rs") {
                return Err(LookoutError::Llm("timed out".into()));
            }
            if prompt.contains("File: quiet.rs") {
                return Ok(String::new());
            }
            Ok("This is a critical security issue\nMinor: could improve naming".into())
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn chunk(path: &str, start: u32) -> ChangeChunk {
        ChangeChunk {
            file_path: path.into(),
            file_type: "rs".into(),
            start_line: start,
            added_lines: vec!["let a = b.c();".into()],
            removed_lines: vec![],
            context: "+let a = b.c();\n".into(),
            change_type: ChangeType::Modified,
        }
    }

    #[tokio::test]
    async fn failures_are_isolated_per_chunk() {
        let engine = LlmReviewEngine::new(Arc::new(ScriptedClient));
        let pr = PullRequestContext::default();
        let findings = engine
            .analyze_with_llm(
                &pr,
                &[chunk("ok.rs", 5), chunk("fail.rs", 9), chunk("quiet.rs", 1)],
            )
            .await;
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.file_path == "ok.rs" && f.line_number == 5));
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[1].severity, Severity::Medium);
        assert_eq!(engine.model(), "scripted");
    }

    #[tokio::test]
    async fn no_chunks_no_calls() {
        let engine = LlmReviewEngine::new(Arc::new(ScriptedClient));
        let findings = engine
            .analyze_with_llm(&PullRequestContext::default(), &[])
            .await;
        assert!(findings.is_empty());
    }
}
