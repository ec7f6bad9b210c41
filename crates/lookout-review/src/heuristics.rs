//! Pattern-based rule engine.
//!
//! Rules are registered once at startup and never change afterwards. The
//! engine fans chunks out over the rayon pool; within one chunk the rules run
//! one after another in priority order.

use std::panic::{self, AssertUnwindSafe};

use lookout_core::{ChangeChunk, Finding, LookoutError};
use rayon::prelude::*;

use crate::rules::{NullPointerDetectionRule, SecretsDetectionRule};

/// A single pattern-based check over one change chunk.
///
/// Implementations must be pure functions of the chunk.
///
/// # Examples
///
/// ```
/// use lookout_core::{ChangeChunk, Finding, LookoutError};
/// use lookout_review::heuristics::Rule;
///
/// struct NoTabs;
///
/// impl Rule for NoTabs {
///     fn name(&self) -> &str {
///         "NoTabs"
///     }
///     fn priority(&self) -> u32 {
///         10
///     }
///     fn analyze(&self, _chunk: &ChangeChunk) -> Result<Vec<Finding>, LookoutError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &str;

    /// Display tie-breaker; never filters.
    fn priority(&self) -> u32;

    /// Inspect one chunk.
    ///
    /// # Errors
    ///
    /// An error drops this rule's findings for the chunk; other rules still run.
    fn analyze(&self, chunk: &ChangeChunk) -> Result<Vec<Finding>, LookoutError>;
}

/// Read-only set of rules, ordered by descending priority.
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// Build a registry from an explicit list of rules.
    pub fn new(mut rules: Vec<Box<dyn Rule>>) -> Self {
        rules.sort_by_key(|r| std::cmp::Reverse(r.priority()));
        Self { rules }
    }

    /// Registry holding the built-in secrets and null-dereference rules.
    ///
    /// # Examples
    ///
    /// ```
    /// use lookout_review::heuristics::RuleRegistry;
    ///
    /// let registry = RuleRegistry::with_builtin_rules();
    /// assert_eq!(registry.names(), vec!["SecretsDetectionRule", "NullPointerDetectionRule"]);
    /// ```
    pub fn with_builtin_rules() -> Self {
        Self::new(vec![
            Box::new(NullPointerDetectionRule),
            Box::new(SecretsDetectionRule),
        ])
    }

    /// Registered rules in execution order.
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Rule names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

/// Runs every registered rule against every chunk.
///
/// # Examples
///
/// ```
/// use lookout_core::{ChangeChunk, ChangeType};
/// use lookout_review::heuristics::{HeuristicEngine, RuleRegistry};
///
/// let engine = HeuristicEngine::new(RuleRegistry::with_builtin_rules());
/// let chunk = ChangeChunk {
///     file_path: "app.py".into(),
///     file_type: "py".into(),
///     start_line: 3,
///     added_lines: vec![r#"api_key = "abcdefghij12345""#.into()],
///     removed_lines: vec![],
///     context: String::new(),
///     change_type: ChangeType::Modified,
/// };
/// let findings = engine.analyze(&[chunk]);
/// assert!(findings.iter().any(|f| f.category == "SECURITY"));
/// ```
pub struct HeuristicEngine {
    registry: RuleRegistry,
}

impl HeuristicEngine {
    /// Engine over a fixed registry; rules cannot be added afterwards.
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    /// Analyse all chunks in parallel and collect the findings.
    ///
    /// Output order across chunks is not meaningful; the merger sorts.
    pub fn analyze(&self, chunks: &[ChangeChunk]) -> Vec<Finding> {
        chunks
            .par_iter()
            .flat_map_iter(|chunk| self.analyze_chunk(chunk))
            .collect()
    }

    /// Run all rules sequentially on one chunk, isolating failures.
    pub fn analyze_chunk(&self, chunk: &ChangeChunk) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in self.registry.rules() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.analyze(chunk)));
            match outcome {
                Ok(Ok(mut found)) => findings.append(&mut found),
                Ok(Err(e)) => {
                    tracing::warn!(rule = rule.name(), file = %chunk.file_path, error = %e, "rule failed");
                }
                Err(_) => {
                    tracing::warn!(rule = rule.name(), file = %chunk.file_path, "rule panicked");
                }
            }
        }
        findings
    }
}
