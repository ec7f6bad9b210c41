use std::fmt::Write;
use std::sync::Arc;

use lookout_core::{Finding, FindingSource, LookoutError, PullRequestContext, Severity};

use crate::github::PullRequestHost;

/// Hidden marker appended to every published review, used to find old ones.
pub const REVIEW_MARKER: &str = "<!-- lookout:review -->";

const SEVERITY_ORDER: [Severity; 5] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
    Severity::Info,
];

/// Render the consolidated review body for already-ranked findings.
///
/// # Examples
///
/// ```
/// use lookout_review::publish::render_review_markdown;
///
/// let body = render_review_markdown(&[]);
/// assert!(body.starts_with("## Code Review Analysis"));
/// assert!(body.contains("No issues found"));
/// ```
pub fn render_review_markdown(findings: &[Finding]) -> String {
    let mut out = String::from("## Code Review Analysis\n\n");

    if findings.is_empty() {
        out.push_str("No issues found in the analysed changes.\n\n");
        out.push_str(REVIEW_MARKER);
        out.push('\n');
        return out;
    }

    let _ = writeln!(out, "{}\n", tally_line(findings));

    for (i, f) in findings.iter().enumerate() {
        let _ = writeln!(
            out,
            "### {}. [{}] `{}:{}` · {}\n",
            i + 1,
            f.severity,
            f.file_path,
            f.line_number,
            f.category
        );
        let _ = writeln!(out, "{}\n", f.message);
        if let Some(s) = &f.suggestion {
            let _ = writeln!(out, "> **Suggestion:** {s}\n");
        }
        let source = match f.source {
            FindingSource::Heuristic => "heuristic rule",
            FindingSource::Llm => "LLM review",
        };
        let _ = writeln!(
            out,
            "_Source: {source} · confidence {:.0}%_\n",
            f.confidence * 100.0
        );
    }

    out.push_str(REVIEW_MARKER);
    out.push('\n');
    out
}

fn tally_line(findings: &[Finding]) -> String {
    let counts: Vec<String> = SEVERITY_ORDER
        .iter()
        .filter_map(|sev| {
            let n = findings.iter().filter(|f| f.severity == *sev).count();
            (n > 0).then(|| format!("{n} {}", sev.as_str().to_lowercase()))
        })
        .collect();
    let noun = if findings.len() == 1 { "finding" } else { "findings" };
    format!("**{} {noun}**: {}", findings.len(), counts.join(", "))
}

/// Publishes the consolidated review as a single PR comment.
pub struct ReviewPublisher {
    host: Arc<dyn PullRequestHost>,
    delete_previous: bool,
}

impl ReviewPublisher {
    /// `delete_previous` removes earlier lookout comments before posting.
    pub fn new(host: Arc<dyn PullRequestHost>, delete_previous: bool) -> Self {
        Self {
            host,
            delete_previous,
        }
    }

    /// Post the review; a failed cleanup is logged and does not block posting.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] if the comment cannot be posted.
    pub async fn publish(
        &self,
        pr: &PullRequestContext,
        findings: &[Finding],
    ) -> Result<(), LookoutError> {
        if self.delete_previous {
            match self.host.delete_previous_reviews(pr, REVIEW_MARKER).await {
                Ok(n) => tracing::debug!(pr = %pr, deleted = n, "removed previous reviews"),
                Err(e) => tracing::warn!(pr = %pr, error = %e, "failed to delete previous reviews"),
            }
        }

        let body = render_review_markdown(findings);
        self.host.post_comment(pr, &body).await?;
        tracing::info!(pr = %pr, findings = findings.len(), "review published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lookout_core::{POTENTIAL_BUG, SECURITY};

    use super::*;

    #[derive(Default)]
    struct RecordingHost {
        calls: Mutex<Vec<String>>,
        fail_delete: bool,
    }

    #[async_trait]
    impl PullRequestHost for RecordingHost {
        async fn fetch_diff(&self, _pr: &PullRequestContext) -> Result<String, LookoutError> {
            Ok(String::new())
        }

        async fn post_comment(
            &self,
            _pr: &PullRequestContext,
            body: &str,
        ) -> Result<(), LookoutError> {
            self.calls.lock().unwrap().push(format!("post:{body}"));
            Ok(())
        }

        async fn delete_previous_reviews(
            &self,
            _pr: &PullRequestContext,
            marker: &str,
        ) -> Result<usize, LookoutError> {
            self.calls.lock().unwrap().push(format!("delete:{marker}"));
            if self.fail_delete {
                Err(LookoutError::GitHub("403".into()))
            } else {
                Ok(1)
            }
        }
    }

    fn secret() -> Finding {
        Finding::new(
            FindingSource::Heuristic,
            "config.py",
            3,
            Severity::Critical,
            SECURITY,
            "Potential API_KEY detected in code",
        )
        .with_suggestion("Remove secret and rotate credentials if already exposed")
        .with_confidence(0.95)
        .with_precedence(1000)
    }

    fn null_deref() -> Finding {
        Finding::new(
            FindingSource::Heuristic,
            "Svc.java",
            21,
            Severity::High,
            POTENTIAL_BUG,
            "Potential null pointer dereference without null check",
        )
        .with_confidence(0.7)
        .with_precedence(500)
    }

    #[test]
    fn empty_review_says_no_issues_and_carries_marker() {
        let body = render_review_markdown(&[]);
        assert!(body.contains("No issues found"));
        assert!(body.trim_end().ends_with(REVIEW_MARKER));
    }

    #[test]
    fn findings_are_listed_in_order_with_details() {
        let body = render_review_markdown(&[secret(), null_deref()]);
        assert!(body.starts_with("## Code Review Analysis"));
        assert!(body.contains("**2 findings**: 1 critical, 1 high"));
        assert!(body.contains("### 1. [CRITICAL] `config.py:3` · SECURITY"));
        assert!(body.contains("### 2. [HIGH] `Svc.java:21` · POTENTIAL_BUG"));
        assert!(body.contains("> **Suggestion:** Remove secret"));
        assert!(body.contains("confidence 95%"));
        assert!(!body.contains("No issues found"));
        let first = body.find("config.py").unwrap();
        let second = body.find("Svc.java").unwrap();
        assert!(first < second);
        assert!(body.trim_end().ends_with(REVIEW_MARKER));
    }

    #[test]
    fn single_finding_tally_is_singular() {
        let body = render_review_markdown(&[null_deref()]);
        assert!(body.contains("**1 finding**: 1 high"));
    }

    #[tokio::test]
    async fn publish_deletes_then_posts() {
        let host = Arc::new(RecordingHost::default());
        let publisher = ReviewPublisher::new(host.clone(), true);
        publisher
            .publish(&PullRequestContext::default(), &[secret()])
            .await
            .unwrap();
        let calls = host.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], format!("delete:{REVIEW_MARKER}"));
        assert!(calls[1].starts_with("post:## Code Review Analysis"));
    }

    #[tokio::test]
    async fn failed_cleanup_still_posts() {
        let host = Arc::new(RecordingHost {
            fail_delete: true,
            ..RecordingHost::default()
        });
        let publisher = ReviewPublisher::new(host.clone(), true);
        publisher
            .publish(&PullRequestContext::default(), &[])
            .await
            .unwrap();
        assert!(host.calls.lock().unwrap()[1].contains("No issues found"));
    }

    #[tokio::test]
    async fn cleanup_skipped_when_disabled() {
        let host = Arc::new(RecordingHost::default());
        ReviewPublisher::new(host.clone(), false)
            .publish(&PullRequestContext::default(), &[])
            .await
            .unwrap();
        let calls = host.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("post:"));
    }
}
