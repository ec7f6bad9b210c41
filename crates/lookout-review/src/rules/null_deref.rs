use std::sync::LazyLock;

use lookout_core::{ChangeChunk, Finding, FindingSource, LookoutError, Severity, POTENTIAL_BUG};
use regex::Regex;

use crate::heuristics::Rule;

/// `<token>.<identifier>` member access.
static MEMBER_ACCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w\]\)]\s*\.\s*\w+").expect("valid member access pattern"));

/// Markers that suggest the access is already guarded.
const GUARDS: [&str; 3] = ["?.", "try", "if"];

/// Flags member accesses on added lines that carry no visible null guard.
pub struct NullPointerDetectionRule;

impl Rule for NullPointerDetectionRule {
    fn name(&self) -> &str {
        "NullPointerDetectionRule"
    }

    fn priority(&self) -> u32 {
        500
    }

    fn analyze(&self, chunk: &ChangeChunk) -> Result<Vec<Finding>, LookoutError> {
        let findings = chunk
            .added_lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                MEMBER_ACCESS.is_match(line) && !GUARDS.iter().any(|g| line.contains(g))
            })
            .map(|(i, _)| {
                let offset = u32::try_from(i).unwrap_or(u32::MAX);
                Finding::new(
                    FindingSource::Heuristic,
                    &chunk.file_path,
                    chunk.start_line.saturating_add(offset),
                    Severity::High,
                    POTENTIAL_BUG,
                    "Potential null pointer dereference without null check",
                )
                .with_suggestion("Add null checks or use optional/safe navigation operators")
                .with_confidence(0.70)
                .with_precedence(500)
            })
            .collect();
        Ok(findings)
    }
}
