use lookout_core::ChangeType;
use lookout_difflens::filter::DiffLimits;
use lookout_difflens::parser::parse_change_chunks;

const FIXTURE: &str = include_str!("fixtures/pull_request.diff");

#[test]
fn parse_patch_without_git_header() {
    let diff = "\
--- /dev/null
+++ b/demos/bad_code.rs
@@ -0,0 +1,3 @@
+fn main() {
+    println!(\"hello\");
+}
";
    let chunks = parse_change_chunks(diff);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].file_path, "demos/bad_code.rs");
    assert_eq!(chunks[0].change_type, ChangeType::Added);
}

#[test]
fn fixture_yields_one_chunk_per_hunk() {
    let chunks = parse_change_chunks(FIXTURE);
    let summary: Vec<(&str, u32, ChangeType)> = chunks
        .iter()
        .map(|c| (c.file_path.as_str(), c.start_line, c.change_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("src/main/java/com/example/UserService.java", 12, ChangeType::Modified),
            ("src/main/java/com/example/UserService.java", 42, ChangeType::Modified),
            ("config/settings.py", 1, ChangeType::Added),
            ("docs/guide.md", 1, ChangeType::Modified),
            ("scripts/legacy.sh", 1, ChangeType::Deleted),
        ]
    );
}

#[test]
fn fixture_added_line_counts_match_plus_lines() {
    let chunks = parse_change_chunks(FIXTURE);
    let added: Vec<usize> = chunks.iter().map(|c| c.added_lines.len()).collect();
    assert_eq!(added, vec![3, 1, 4, 1, 0]);
    assert_eq!(chunks[0].removed_lines.len(), 1);
    assert_eq!(chunks[0].file_type, "java");
    assert_eq!(chunks[2].file_type, "py");
    assert_eq!(chunks[4].file_type, "sh");
}

#[test]
fn fixture_respects_file_limit() {
    let limits = DiffLimits {
        max_diff_size_bytes: 1_048_576,
        max_files_per_pr: 2,
    };
    let kept = limits.apply(parse_change_chunks(FIXTURE));
    assert_eq!(kept.len(), 3);
    assert!(kept.iter().all(|c| c.file_path != "docs/guide.md"));
}
