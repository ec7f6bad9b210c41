use std::path::Path;
use std::process::{Command, Output};

use lookout_core::Severity;

const LEAKED_KEY_DIFF: &str = "\
diff --git a/settings.py b/settings.py
--- a/settings.py
+++ b/settings.py
@@ -1,2 +1,3 @@
 DEBUG = False
+API_KEY = \"sk-live-1234567890abcdef\"
 TIMEOUT = 30
";

const CLEAN_DIFF: &str = "\
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1,1 +1,2 @@
 # widgets
+Small library of widgets.
";

fn review(dir: &Path, diff: &str, extra: &[&str]) -> Output {
    let diff_path = dir.join("change.diff");
    std::fs::write(&diff_path, diff).unwrap();
    Command::new(env!("CARGO_BIN_EXE_lookout"))
        .args(["review", "--no-llm", "--file"])
        .arg(&diff_path)
        .args(extra)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn threshold_ranking() {
    let threshold = Severity::High;

    assert!(Severity::Critical.meets_threshold(threshold));
    assert!(Severity::High.meets_threshold(threshold));
    assert!(!Severity::Medium.meets_threshold(threshold));
    assert!(!Severity::Info.meets_threshold(threshold));
}

#[test]
fn fail_on_exits_one_when_secret_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = review(dir.path(), LEAKED_KEY_DIFF, &["--fail-on", "high"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("API_KEY"), "stdout was: {stdout}");
}

#[test]
fn fail_on_exits_zero_when_nothing_meets_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let output = review(dir.path(), CLEAN_DIFF, &["--fail-on", "info"]);

    assert!(
        output.status.success(),
        "lookout review failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn markdown_output_is_the_comment_body() {
    let dir = tempfile::tempdir().unwrap();
    let output = review(dir.path(), LEAKED_KEY_DIFF, &["--format", "markdown"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("## Code Review Analysis"));
    assert!(stdout.contains("<!-- lookout:review -->"));
}
