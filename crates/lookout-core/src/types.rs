use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category tag for leaked credentials and other security problems.
pub const SECURITY: &str = "SECURITY";
/// Category tag for likely defects found by pattern rules.
pub const POTENTIAL_BUG: &str = "POTENTIAL_BUG";
/// Category tag for observations produced by the LLM reviewer.
pub const CODE_REVIEW: &str = "CODE_REVIEW";

/// One contiguous hunk of one file in a unified diff.
///
/// Chunks are produced by the diff parser and never modified afterwards.
///
/// # Examples
///
/// ```
/// use lookout_core::{ChangeChunk, ChangeType};
///
/// let chunk = ChangeChunk {
///     file_path: "src/Main.java".into(),
///     file_type: "java".into(),
///     start_line: 12,
///     added_lines: vec!["    int x = 1;".into()],
///     removed_lines: vec![],
///     context: "+    int x = 1;\n".into(),
///     change_type: ChangeType::Modified,
/// };
/// assert_eq!(chunk.start_line, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeChunk {
    /// Post-change path of the file.
    pub file_path: String,
    /// Lowercase extension, or `"unknown"`.
    pub file_type: String,
    /// 1-based line in the new file where the hunk begins.
    pub start_line: u32,
    /// Added lines without the leading `+`.
    pub added_lines: Vec<String>,
    /// Removed lines without the leading `-`.
    pub removed_lines: Vec<String>,
    /// Every hunk line in prefixed form (`+`, `-`, ` `), newline-terminated.
    pub context: String,
    /// Classification of the owning file's change.
    pub change_type: ChangeType,
}

/// Classification of a changed file.
///
/// Renames collapse to [`ChangeType::Modified`].
///
/// # Examples
///
/// ```
/// use lookout_core::ChangeType;
///
/// assert_eq!(ChangeType::Added.to_string(), "ADDED");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    /// The file is new in this change.
    Added,
    /// The file existed before and after.
    #[default]
    Modified,
    /// The file is removed by this change.
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Added => write!(f, "ADDED"),
            ChangeType::Modified => write!(f, "MODIFIED"),
            ChangeType::Deleted => write!(f, "DELETED"),
        }
    }
}

/// How serious a finding is.
///
/// Ordered `CRITICAL > HIGH > MEDIUM > LOW > INFO`.
///
/// # Examples
///
/// ```
/// use lookout_core::Severity;
///
/// let s: Severity = "high".parse().unwrap();
/// assert_eq!(s, Severity::High);
/// assert!(Severity::Critical.rank() > Severity::Info.rank());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Must be fixed before merging.
    Critical,
    /// Likely defect.
    High,
    /// Worth a look.
    Medium,
    /// Minor.
    Low,
    /// Informational only.
    Info,
}

impl Severity {
    /// Numeric rank used for sorting; higher is more severe.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }

    /// Whether this severity is at least as serious as `threshold`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lookout_core::Severity;
    ///
    /// assert!(Severity::Critical.meets_threshold(Severity::High));
    /// assert!(!Severity::Low.meets_threshold(Severity::Medium));
    /// ```
    pub fn meets_threshold(self, threshold: Severity) -> bool {
        self.rank() >= threshold.rank()
    }

    /// Uppercase label as shown in published reviews.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" => Ok(Severity::Low),
            "INFO" => Ok(Severity::Info),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Which engine produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FindingSource {
    /// A pattern-based rule.
    Heuristic,
    /// The LLM reviewer.
    Llm,
}

impl fmt::Display for FindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingSource::Heuristic => write!(f, "HEURISTIC"),
            FindingSource::Llm => write!(f, "LLM"),
        }
    }
}

/// One observation about one line of one file.
///
/// Findings live for a single review and are not mutated once built.
///
/// # Examples
///
/// ```
/// use lookout_core::{Finding, FindingSource, Severity, SECURITY};
///
/// let f = Finding::new(
///     FindingSource::Heuristic,
///     "config.py",
///     3,
///     Severity::Critical,
///     SECURITY,
///     "Potential API_KEY detected in code",
/// )
/// .with_confidence(0.95)
/// .with_precedence(1000);
/// assert_eq!(f.dedup_key(), "config.py:3:SECURITY");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Unique per finding instance.
    pub id: String,
    /// Path of the file the finding refers to.
    pub file_path: String,
    /// 1-based line number in the new file.
    pub line_number: u32,
    /// Severity of the finding.
    pub severity: Severity,
    /// Short domain tag such as [`SECURITY`].
    pub category: String,
    /// Human-readable description.
    pub message: String,
    /// Optional remediation hint.
    pub suggestion: Option<String>,
    /// Engine that produced the finding.
    pub source: FindingSource,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Primary sort key for presentation; higher comes first.
    pub precedence_score: u32,
}

impl Finding {
    /// Build a finding with a fresh id, zero confidence and zero precedence.
    pub fn new(
        source: FindingSource,
        file_path: impl Into<String>,
        line_number: u32,
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.into(),
            line_number,
            severity,
            category: category.into(),
            message: message.into(),
            suggestion: None,
            source,
            confidence: 0.0,
            precedence_score: 0,
        }
    }

    /// Attach a remediation hint.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Set the confidence, clamped to `[0.0, 1.0]`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set the precedence score.
    pub fn with_precedence(mut self, precedence_score: u32) -> Self {
        self.precedence_score = precedence_score;
        self
    }

    /// Deduplication key `"<file>:<line>:<category>"`.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}:{}", self.file_path, self.line_number, self.category)
    }
}

/// Identification and metadata of the pull request under review.
///
/// # Examples
///
/// ```
/// use lookout_core::PullRequestContext;
///
/// let pr = PullRequestContext {
///     owner: "octocat".into(),
///     repo: "hello-world".into(),
///     pr_number: 42,
///     title: "Add greeting".into(),
///     description: None,
///     author_login: "octocat".into(),
///     base_ref: "main".into(),
///     head_ref: "feature/greeting".into(),
///     commit_sha: "abc123".into(),
///     installation_id: None,
/// };
/// assert_eq!(pr.to_string(), "octocat/hello-world#42");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestContext {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub pr_number: u64,
    /// Pull request title.
    pub title: String,
    /// Pull request body, absent when the author left it empty.
    pub description: Option<String>,
    /// Login of the pull request author.
    pub author_login: String,
    /// Target branch.
    pub base_ref: String,
    /// Source branch.
    pub head_ref: String,
    /// Head commit of the source branch.
    pub commit_sha: String,
    /// GitHub App installation that delivered the webhook.
    #[serde(default)]
    pub installation_id: Option<u64>,
}

impl fmt::Display for PullRequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.pr_number)
    }
}
