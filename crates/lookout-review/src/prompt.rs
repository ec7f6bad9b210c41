use lookout_core::{
    ChangeChunk, Finding, FindingSource, PullRequestContext, Severity, CODE_REVIEW,
};

const PREAMBLE: &str = "You are an expert code reviewer. Analyze the following code change \
and provide specific, actionable feedback.";

const RESPONSE_FORMAT: &str = "\
Provide your review in a structured format:
1. Issues Found (if any): List each issue with severity (CRITICAL, HIGH, MEDIUM, LOW)
2. Suggestions for Improvement
3. Positive Observations (if any)

Be concise and focus on substantive issues.";

/// Trigger words per severity, checked top to bottom; first hit wins.
const CLASSIFICATION: [(&[&str], Severity, f64, u32); 3] = [
    (&["critical", "danger"], Severity::Critical, 0.85, 700),
    (&["high", "issue", "bug"], Severity::High, 0.80, 650),
    (&["medium", "warning", "improve"], Severity::Medium, 0.75, 600),
];

/// Build the review prompt for one chunk.
///
/// # Examples
///
/// ```
/// use lookout_core::{ChangeChunk, ChangeType, PullRequestContext};
/// use lookout_review::prompt::build_review_prompt;
///
/// let chunk = ChangeChunk {
///     file_path: "src/App.java".into(),
///     file_type: "java".into(),
///     start_line: 4,
///     added_lines: vec!["int x = 1;".into()],
///     removed_lines: vec![],
///     context: "+int x = 1;\n".into(),
///     change_type: ChangeType::Added,
/// };
/// let pr = PullRequestContext { title: "Add x".into(), ..Default::default() };
/// let prompt = build_review_prompt(&chunk, &pr);
/// assert!(prompt.contains("File: src/App.java"));
/// assert!(prompt.contains("Change Type: ADDED"));
/// assert!(prompt.contains("PR Description: No description"));
/// ```
pub fn build_review_prompt(chunk: &ChangeChunk, pr: &PullRequestContext) -> String {
    let description = pr
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("No description");

    format!(
        "{PREAMBLE}\n\n\
         File: {file}\n\
         Change Type: {change_type}\n\n\
         Changed Code:\n{code}\n\n\
         Context:\n{context}\n\n\
         PR Title: {title}\n\
         PR Description: {description}\n\n\
         {RESPONSE_FORMAT}\n",
        file = chunk.file_path,
        change_type = chunk.change_type,
        code = chunk.added_lines.join("\n"),
        context = chunk.context,
        title = pr.title,
    )
}

/// Turn a free-form model reply into findings, at most one per line.
///
/// Each line is lowercased and matched against trigger words; lines
/// without a trigger are dropped. Findings are placed at the chunk's start
/// line and carry the trimmed original text as their message.
///
/// # Examples
///
/// ```
/// use lookout_core::{ChangeChunk, ChangeType, Severity};
/// use lookout_review::prompt::classify_response;
///
/// let chunk = ChangeChunk {
///     file_path: "a.rs".into(),
///     file_type: "rs".into(),
///     start_line: 12,
///     added_lines: vec!["x".into()],
///     removed_lines: vec![],
///     context: String::new(),
///     change_type: ChangeType::Modified,
/// };
/// let findings = classify_response("This is a critical security issue", &chunk);
/// assert_eq!(findings.len(), 1);
/// assert_eq!(findings[0].severity, Severity::Critical);
/// assert_eq!(findings[0].precedence_score, 700);
/// ```
pub fn classify_response(response: &str, chunk: &ChangeChunk) -> Vec<Finding> {
    response
        .split('\n')
        .filter_map(|line| {
            let lowered = line.to_lowercase();
            let (_, severity, confidence, precedence) = CLASSIFICATION
                .iter()
                .find(|(triggers, ..)| triggers.iter().any(|t| lowered.contains(t)))?;
            Some(
                Finding::new(
                    FindingSource::Llm,
                    &chunk.file_path,
                    chunk.start_line,
                    *severity,
                    CODE_REVIEW,
                    line.trim(),
                )
                .with_confidence(*confidence)
                .with_precedence(*precedence),
            )
        })
        .collect()
}
