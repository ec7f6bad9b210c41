use std::fmt;
use std::sync::Arc;

use lookout_core::{BotConfig, ChangeChunk, Finding, LookoutError, PullRequestContext};
use lookout_difflens::filter::{distinct_files, DiffLimits};
use lookout_difflens::parser::parse_change_chunks;
use serde::Serialize;

use crate::engine::LlmReviewEngine;
use crate::github::PullRequestHost;
use crate::heuristics::HeuristicEngine;
use crate::merge::merge_and_rank;
use crate::publish::{render_review_markdown, ReviewPublisher};

/// Result of a completed code review.
///
/// # Examples
///
/// ```
/// use lookout_review::pipeline::{ReviewResult, ReviewStats};
///
/// let result = ReviewResult {
///     findings: vec![],
///     stats: ReviewStats::default(),
/// };
/// assert!(result.to_markdown().contains("No issues found"));
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// Deduplicated findings in presentation order.
    pub findings: Vec<Finding>,
    /// Statistics about the review run.
    pub stats: ReviewStats,
}

/// Statistics about a review run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    /// Distinct files that were analysed.
    pub files_reviewed: usize,
    /// Chunks analysed after limits were applied.
    pub chunks: usize,
    /// Raw findings from the heuristic rules.
    pub heuristic_findings: usize,
    /// Raw findings from the LLM reviewer.
    pub llm_findings: usize,
    /// Findings left after deduplication.
    pub merged_findings: usize,
    /// Model identifier, absent when the LLM branch was skipped.
    pub model_used: Option<String>,
}

impl ReviewResult {
    /// Render the exact comment body that would be published.
    pub fn to_markdown(&self) -> String {
        render_review_markdown(&self.findings)
    }
}

impl fmt::Display for ReviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Review Results")?;
        writeln!(f, "==============")?;
        writeln!(
            f,
            "Model: {} | Files: {} | Chunks: {} | Findings: {} (heuristic: {}, llm: {})\n",
            self.stats.model_used.as_deref().unwrap_or("none"),
            self.stats.files_reviewed,
            self.stats.chunks,
            self.stats.merged_findings,
            self.stats.heuristic_findings,
            self.stats.llm_findings,
        )?;

        if self.findings.is_empty() {
            writeln!(f, "No issues found.")?;
        } else {
            for finding in &self.findings {
                writeln!(
                    f,
                    "[{}] {}:{} {} (confidence: {:.0}%)",
                    finding.severity,
                    finding.file_path,
                    finding.line_number,
                    finding.category,
                    finding.confidence * 100.0,
                )?;
                writeln!(f, "  {}", finding.message)?;
                if let Some(s) = &finding.suggestion {
                    writeln!(f, "  Suggestion: {s}")?;
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

/// Parse, analyse and merge: everything up to publication.
///
/// Heuristics run on blocking threads (rayon inside); the LLM branch runs
/// concurrently on the async runtime. Merging waits for both.
pub struct ReviewPipeline {
    heuristics: Option<Arc<HeuristicEngine>>,
    llm: Option<LlmReviewEngine>,
    limits: DiffLimits,
}

impl ReviewPipeline {
    /// A pipeline with both branches off and default limits.
    pub fn new(limits: DiffLimits) -> Self {
        Self {
            heuristics: None,
            llm: None,
            limits,
        }
    }

    /// Build from configuration. `llm` is only kept when both LLM switches are on.
    pub fn from_config(
        config: &BotConfig,
        heuristics: HeuristicEngine,
        llm: Option<LlmReviewEngine>,
    ) -> Self {
        let mut pipeline = Self::new(DiffLimits::from_config(&config.app));
        if config.app.heuristics_enabled {
            pipeline = pipeline.with_heuristics(heuristics);
        }
        if config.llm_branch_enabled() {
            if let Some(engine) = llm {
                pipeline = pipeline.with_llm(engine);
            }
        }
        pipeline
    }

    /// Enable the heuristic branch.
    pub fn with_heuristics(mut self, engine: HeuristicEngine) -> Self {
        self.heuristics = Some(Arc::new(engine));
        self
    }

    /// Enable the LLM branch.
    pub fn with_llm(mut self, engine: LlmReviewEngine) -> Self {
        self.llm = Some(engine);
        self
    }

    /// Review a raw diff. Returns `Ok(None)` when the diff exceeds the size limit.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Parse`] if the parser task cannot be joined.
    pub async fn analyze(
        &self,
        pr: &PullRequestContext,
        diff: &str,
    ) -> Result<Option<ReviewResult>, LookoutError> {
        if self.limits.exceeds_size(diff) {
            tracing::warn!(
                pr = %pr,
                size = diff.len(),
                limit = self.limits.max_diff_size_bytes,
                "diff exceeds size limit, skipping review"
            );
            return Ok(None);
        }

        let limits = self.limits;
        let raw = diff.to_string();
        let chunks = tokio::task::spawn_blocking(move || limits.apply(parse_change_chunks(&raw)))
            .await
            .map_err(|e| LookoutError::Parse(format!("diff parser task failed: {e}")))?;
        let chunks = Arc::new(chunks);
        tracing::debug!(pr = %pr, chunks = chunks.len(), "diff parsed");

        let (heuristic, llm) = tokio::join!(
            self.run_heuristics(Arc::clone(&chunks)),
            self.run_llm(pr, &chunks)
        );

        let stats_base = ReviewStats {
            files_reviewed: distinct_files(&chunks),
            chunks: chunks.len(),
            heuristic_findings: heuristic.len(),
            llm_findings: llm.len(),
            merged_findings: 0,
            model_used: self.llm.as_ref().map(|e| e.model().to_string()),
        };

        let mut combined = heuristic;
        combined.extend(llm);
        let findings = merge_and_rank(combined);

        Ok(Some(ReviewResult {
            stats: ReviewStats {
                merged_findings: findings.len(),
                ..stats_base
            },
            findings,
        }))
    }

    async fn run_heuristics(&self, chunks: Arc<Vec<ChangeChunk>>) -> Vec<Finding> {
        let Some(engine) = self.heuristics.clone() else {
            return Vec::new();
        };
        match tokio::task::spawn_blocking(move || engine.analyze(&chunks)).await {
            Ok(findings) => findings,
            Err(e) => {
                tracing::warn!(error = %e, "heuristic analysis task failed");
                Vec::new()
            }
        }
    }

    async fn run_llm(&self, pr: &PullRequestContext, chunks: &[ChangeChunk]) -> Vec<Finding> {
        match &self.llm {
            Some(engine) => engine.analyze_with_llm(pr, chunks).await,
            None => Vec::new(),
        }
    }
}

/// Drives one pull request end to end: fetch, analyse, publish.
pub struct ReviewOrchestrator {
    host: Arc<dyn PullRequestHost>,
    pipeline: ReviewPipeline,
    publisher: ReviewPublisher,
}

impl ReviewOrchestrator {
    /// `delete_previous` is passed to the [`ReviewPublisher`].
    pub fn new(
        host: Arc<dyn PullRequestHost>,
        pipeline: ReviewPipeline,
        delete_previous: bool,
    ) -> Self {
        let publisher = ReviewPublisher::new(Arc::clone(&host), delete_previous);
        Self {
            host,
            pipeline,
            publisher,
        }
    }

    /// Review and publish; returns `Ok(None)` when the diff was skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] if the diff cannot be fetched or the
    /// review cannot be posted.
    pub async fn review(
        &self,
        pr: &PullRequestContext,
    ) -> Result<Option<ReviewResult>, LookoutError> {
        let diff = self.host.fetch_diff(pr).await?;
        let Some(result) = self.pipeline.analyze(pr, &diff).await? else {
            return Ok(None);
        };
        self.publisher.publish(pr, &result.findings).await?;
        Ok(Some(result))
    }

    /// Background entry point: never fails, errors are logged.
    #[tracing::instrument(skip_all, fields(owner = %pr.owner, repo = %pr.repo, pr = pr.pr_number))]
    pub async fn process_pull_request(&self, pr: PullRequestContext) {
        tracing::info!("review started");
        match self.review(&pr).await {
            Ok(Some(result)) => tracing::info!(
                findings = result.stats.merged_findings,
                chunks = result.stats.chunks,
                "review finished"
            ),
            Ok(None) => tracing::info!("review skipped"),
            Err(e) => tracing::error!(error = %e, "review failed"),
        }
    }
}
