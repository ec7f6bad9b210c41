//! Size and file-count limits applied before any analysis runs.
//!
//! Oversized diffs are skipped outright; beyond the file budget, chunks of
//! later files are dropped so a huge PR still gets a bounded review.

use std::collections::HashSet;

use lookout_core::{AppConfig, ChangeChunk};

/// Limits on how much of a pull request is reviewed.
///
/// # Examples
///
/// ```
/// use lookout_difflens::filter::DiffLimits;
///
/// let limits = DiffLimits::default();
/// assert_eq!(limits.max_diff_size_bytes, 1_048_576);
/// assert!(!limits.exceeds_size("small diff"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLimits {
    /// Diffs longer than this many bytes are not reviewed.
    pub max_diff_size_bytes: u64,
    /// Chunks are kept for at most this many distinct files.
    pub max_files_per_pr: usize,
}

impl Default for DiffLimits {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl DiffLimits {
    /// Build limits from the `[app]` configuration section.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_diff_size_bytes: config.max_diff_size_bytes,
            max_files_per_pr: config.max_files_per_pr,
        }
    }

    /// Whether the raw diff is too large to review.
    pub fn exceeds_size(&self, diff: &str) -> bool {
        diff.len() as u64 > self.max_diff_size_bytes
    }

    /// Keep chunks of the first `max_files_per_pr` distinct files, in diff order.
    ///
    /// # Examples
    ///
    /// ```
    /// use lookout_core::{ChangeChunk, ChangeType};
    /// use lookout_difflens::filter::DiffLimits;
    ///
    /// let chunk = |path: &str| ChangeChunk {
    ///     file_path: path.into(),
    ///     file_type: "rs".into(),
    ///     start_line: 1,
    ///     added_lines: vec!["x".into()],
    ///     removed_lines: vec![],
    ///     context: "+x\n".into(),
    ///     change_type: ChangeType::Modified,
    /// };
    /// let limits = DiffLimits { max_diff_size_bytes: 1024, max_files_per_pr: 1 };
    /// let kept = limits.apply(vec![chunk("a.rs"), chunk("a.rs"), chunk("b.rs")]);
    /// assert_eq!(kept.len(), 2);
    /// ```
    pub fn apply(&self, chunks: Vec<ChangeChunk>) -> Vec<ChangeChunk> {
        let mut files: HashSet<String> = HashSet::new();
        let mut kept = Vec::with_capacity(chunks.len());
        let mut dropped_files: HashSet<String> = HashSet::new();

        for chunk in chunks {
            if files.contains(&chunk.file_path) {
                kept.push(chunk);
            } else if files.len() < self.max_files_per_pr {
                files.insert(chunk.file_path.clone());
                kept.push(chunk);
            } else {
                dropped_files.insert(chunk.file_path);
            }
        }

        if !dropped_files.is_empty() {
            tracing::warn!(
                limit = self.max_files_per_pr,
                dropped = dropped_files.len(),
                "file limit reached, skipping remaining files"
            );
        }

        kept
    }
}

/// Number of distinct files among `chunks`.
pub fn distinct_files(chunks: &[ChangeChunk]) -> usize {
    chunks
        .iter()
        .map(|c| c.file_path.as_str())
        .collect::<HashSet<_>>()
        .len()
}
