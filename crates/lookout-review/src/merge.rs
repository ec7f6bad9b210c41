use std::cmp::Ordering;
use std::collections::HashMap;

use lookout_core::Finding;

/// Deduplicate findings and order them for presentation.
///
/// Findings sharing a [`dedup_key`](Finding::dedup_key) collapse to the one
/// with the strictly highest confidence; on ties the first one wins. Survivors
/// are sorted by precedence, then severity, then confidence, all descending.
/// The sort is stable, so remaining ties keep input order.
///
/// # Examples
///
/// ```
/// use lookout_core::{Finding, FindingSource, Severity};
/// use lookout_review::merge::merge_and_rank;
///
/// let low = Finding::new(FindingSource::Llm, "f.java", 10, Severity::Low, "TEST", "a")
///     .with_confidence(0.5);
/// let high = Finding::new(FindingSource::Llm, "f.java", 10, Severity::Low, "TEST", "b")
///     .with_confidence(0.9);
/// let merged = merge_and_rank(vec![low, high]);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].confidence, 0.9);
/// ```
pub fn merge_and_rank(findings: Vec<Finding>) -> Vec<Finding> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(findings.len());
    let mut kept: Vec<Finding> = Vec::with_capacity(findings.len());

    for finding in findings {
        match index.get(&finding.dedup_key()) {
            Some(&slot) => {
                if finding.confidence > kept[slot].confidence {
                    kept[slot] = finding;
                }
            }
            None => {
                index.insert(finding.dedup_key(), kept.len());
                kept.push(finding);
            }
        }
    }

    kept.sort_by(rank_order);
    kept
}

fn rank_order(a: &Finding, b: &Finding) -> Ordering {
    b.precedence_score
        .cmp(&a.precedence_score)
        .then_with(|| b.severity.rank().cmp(&a.severity.rank()))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
}
