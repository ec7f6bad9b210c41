use lookout_core::{ChangeChunk, ChangeType};

/// Parse a unified diff (as produced by `git diff` or the GitHub diff media
/// type) into one [`ChangeChunk`] per hunk.
///
/// Never fails: unrecognised lines are skipped, and a blob without any hunk
/// yields an empty vector. Binary markers, rename/copy headers, mode lines and
/// `\ No newline at end of file` markers are ignored.
///
/// # Examples
///
/// ```
/// use lookout_difflens::parser::parse_change_chunks;
///
/// let diff = "diff --git a/Hello.java b/Hello.java\n\
///             --- a/Hello.java\n\
///             +++ b/Hello.java\n\
///             @@ -1,3 +1,4 @@\n\
///              class Hello {\n\
///             +    void greet() {}\n\
///              }\n";
/// let chunks = parse_change_chunks(diff);
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].file_type, "java");
/// assert_eq!(chunks[0].added_lines, vec!["    void greet() {}"]);
/// ```
pub fn parse_change_chunks(input: &str) -> Vec<ChangeChunk> {
    let mut state = ParserState::default();

    for line in input.lines() {
        if let Some(hunk) = state.hunk.as_mut() {
            if hunk.accept(line) {
                continue;
            }
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            state.finish_hunk();
            state.path = parse_git_header_path(rest);
            state.old_path = None;
            state.change_type = ChangeType::Modified;
            state.in_git_section = true;
            continue;
        }

        if let Some(raw) = line.strip_prefix("--- ") {
            state.finish_hunk();
            // A `---` outside a git section opens a new file of a plain patch.
            if !state.in_git_section {
                state.path = None;
                state.change_type = ChangeType::Modified;
            }
            match parse_header_path(raw) {
                None => state.change_type = ChangeType::Added,
                Some(p) => state.old_path = Some(p),
            }
            continue;
        }

        if let Some(raw) = line.strip_prefix("+++ ") {
            state.finish_hunk();
            match parse_header_path(raw) {
                None => {
                    state.change_type = ChangeType::Deleted;
                    if state.path.is_none() {
                        state.path = state.old_path.clone();
                    }
                }
                Some(p) => {
                    if state.path.is_none() {
                        state.path = Some(p);
                    }
                }
            }
            continue;
        }

        if line.starts_with("@@") {
            state.finish_hunk();
            state.in_git_section = false;
            match parse_hunk_header(line) {
                Some(header) => state.hunk = Some(HunkBuilder::new(header)),
                None => tracing::debug!(line, "skipping malformed hunk header"),
            }
            continue;
        }
    }

    state.finish_hunk();
    state.chunks
}

#[derive(Default)]
struct ParserState {
    chunks: Vec<ChangeChunk>,
    path: Option<String>,
    old_path: Option<String>,
    change_type: ChangeType,
    in_git_section: bool,
    hunk: Option<HunkBuilder>,
}

impl ParserState {
    fn finish_hunk(&mut self) {
        let Some(hunk) = self.hunk.take() else {
            return;
        };
        let Some(path) = self.path.as_ref() else {
            return;
        };
        if hunk.added.is_empty() && hunk.removed.is_empty() {
            return;
        }
        self.chunks.push(ChangeChunk {
            file_path: path.clone(),
            file_type: file_type(path),
            start_line: hunk.start_line,
            added_lines: hunk.added,
            removed_lines: hunk.removed,
            context: hunk.context,
            change_type: self.change_type,
        });
    }
}

/// Ranges from an `@@ -o[,ol] +n[,nl] @@` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkHeader {
    old_lines: u32,
    new_start: u32,
    new_lines: u32,
}

struct HunkBuilder {
    start_line: u32,
    old_remaining: u32,
    new_remaining: u32,
    added: Vec<String>,
    removed: Vec<String>,
    context: String,
}

impl HunkBuilder {
    fn new(header: HunkHeader) -> Self {
        Self {
            start_line: header.new_start.max(1),
            old_remaining: header.old_lines,
            new_remaining: header.new_lines,
            added: Vec::new(),
            removed: Vec::new(),
            context: String::new(),
        }
    }

    fn in_budget(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }

    /// Consume `line` as hunk content. Returns false when the line belongs
    /// to the surrounding diff structure instead.
    fn accept(&mut self, line: &str) -> bool {
        let in_budget = self.in_budget();

        if line.starts_with('\\') {
            return true;
        }
        if line.is_empty() {
            if in_budget {
                self.push_context("");
            }
            return in_budget;
        }
        // Past the header's budget, `---`/`+++` start the next file.
        if !in_budget && (line.starts_with("---") || line.starts_with("+++")) {
            return false;
        }

        if let Some(text) = line.strip_prefix('+') {
            self.new_remaining = self.new_remaining.saturating_sub(1);
            self.added.push(text.to_string());
            self.context.push('+');
            self.context.push_str(text);
            self.context.push('\n');
            true
        } else if let Some(text) = line.strip_prefix('-') {
            self.old_remaining = self.old_remaining.saturating_sub(1);
            self.removed.push(text.to_string());
            self.context.push('-');
            self.context.push_str(text);
            self.context.push('\n');
            true
        } else if let Some(text) = line.strip_prefix(' ') {
            self.push_context(text);
            true
        } else {
            false
        }
    }

    fn push_context(&mut self, text: &str) {
        self.old_remaining = self.old_remaining.saturating_sub(1);
        self.new_remaining = self.new_remaining.saturating_sub(1);
        self.context.push(' ');
        self.context.push_str(text);
        self.context.push('\n');
    }
}

/// Extract the post-change path from the tail of a `diff --git` line.
fn parse_git_header_path(rest: &str) -> Option<String> {
    if let Some(idx) = rest.rfind(" \"b/") {
        let quoted = &rest[idx + 4..];
        return Some(quoted.trim_end_matches('"').to_string());
    }
    let idx = rest.rfind(" b/")?;
    let path = &rest[idx + 3..];
    (!path.is_empty()).then(|| path.to_string())
}

/// Path from a `---`/`+++` header; `None` for `/dev/null`.
fn parse_header_path(raw: &str) -> Option<String> {
    // Plain patches may carry a tab-separated timestamp.
    let raw = raw.split('\t').next().unwrap_or(raw);
    let normalized = raw.trim().trim_matches('"');

    if normalized == "/dev/null" || normalized.is_empty() {
        return None;
    }

    let stripped = normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized);

    Some(stripped.to_string())
}

fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let inner = line.strip_prefix("@@ ").and_then(|s| {
        let end = s.find(" @@")?;
        Some(&s[..end])
    })?;

    let (old, new) = inner.split_once(' ')?;
    let (_, old_lines) = parse_range(old.strip_prefix('-')?)?;
    let (new_start, new_lines) = parse_range(new.strip_prefix('+')?)?;

    Some(HunkHeader {
        old_lines,
        new_start,
        new_lines,
    })
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Lowercased extension of the last path component, or `"unknown"`.
///
/// # Examples
///
/// ```
/// use lookout_difflens::parser::file_type;
///
/// assert_eq!(file_type("src/Main.JAVA"), "java");
/// assert_eq!(file_type("Makefile"), "unknown");
/// assert_eq!(file_type(".gitignore"), "unknown");
/// ```
pub fn file_type(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name[idx + 1..].to_lowercase(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diff_returns_empty_vec() {
        assert!(parse_change_chunks("").is_empty());
    }

    #[test]
    fn garbage_input_returns_empty_vec() {
        assert!(parse_change_chunks("hello\nworld\n+not in a hunk\n").is_empty());
    }

    #[test]
    fn single_hunk_replacing_one_line() {
        let diff = "\
diff --git a/src/Service.java b/src/Service.java
index abc1234..def5678 100644
--- a/src/Service.java
+++ b/src/Service.java
@@ -1,4 +1,4 @@
 public class Service {
-    void oldMethod() {}
+    void newMethod() {}
 }
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.file_path, "src/Service.java");
        assert_eq!(chunk.file_type, "java");
        assert_eq!(chunk.start_line, 1);
        assert_eq!(chunk.added_lines, vec!["    void newMethod() {}"]);
        assert_eq!(chunk.removed_lines, vec!["    void oldMethod() {}"]);
        assert_eq!(chunk.change_type, ChangeType::Modified);
        assert_eq!(
            chunk.context,
            " public class Service {\n-    void oldMethod() {}\n+    void newMethod() {}\n }\n"
        );
    }

    #[test]
    fn single_file_multiple_hunks() {
        let diff = "\
diff --git a/lib.rs b/lib.rs
--- a/lib.rs
+++ b/lib.rs
@@ -1,3 +1,4 @@
 fn foo() {
+    bar();
 }
@@ -10,3 +11,4 @@
 fn baz() {
+    qux();
 }
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[1].start_line, 11);
        assert_eq!(chunks[1].added_lines, vec!["    qux();"]);
    }

    #[test]
    fn multiple_files() {
        let diff = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1 +1,2 @@
 line1
+line2
diff --git a/b.py b/b.py
--- a/b.py
+++ b/b.py
@@ -1 +1,2 @@
 line1
+line2
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].file_path, "a.rs");
        assert_eq!(chunks[1].file_path, "b.py");
        assert_eq!(chunks[1].file_type, "py");
    }

    #[test]
    fn new_file_is_added() {
        let diff = "\
diff --git a/new.rs b/new.rs
new file mode 100644
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,3 @@
+fn hello() {
+    println!(\"new\");
+}
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].change_type, ChangeType::Added);
        assert_eq!(chunks[0].added_lines.len(), 3);
        assert_eq!(chunks[0].start_line, 1);
    }

    #[test]
    fn deleted_file_keeps_path_and_clamps_start_line() {
        let diff = "\
diff --git a/old.rs b/old.rs
deleted file mode 100644
--- a/old.rs
+++ /dev/null
@@ -1,3 +0,0 @@
-fn goodbye() {
-    println!(\"old\");
-}
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_path, "old.rs");
        assert_eq!(chunks[0].change_type, ChangeType::Deleted);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].removed_lines.len(), 3);
        assert!(chunks[0].added_lines.is_empty());
    }

    #[test]
    fn rename_without_content_emits_nothing() {
        let diff = "\
diff --git a/old_name.rs b/new_name.rs
similarity index 100%
rename from old_name.rs
rename to new_name.rs
";
        assert!(parse_change_chunks(diff).is_empty());
    }

    #[test]
    fn rename_with_edit_uses_new_path_and_is_modified() {
        let diff = "\
diff --git a/old_name.rs b/new_name.rs
similarity index 90%
rename from old_name.rs
rename to new_name.rs
--- a/old_name.rs
+++ b/new_name.rs
@@ -1,2 +1,2 @@
-let a = 1;
+let a = 2;
 done
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_path, "new_name.rs");
        assert_eq!(chunks[0].change_type, ChangeType::Modified);
    }

    #[test]
    fn binary_files_skipped() {
        let diff = "\
diff --git a/image.png b/image.png
Binary files a/image.png and b/image.png differ
diff --git a/code.rs b/code.rs
--- a/code.rs
+++ b/code.rs
@@ -1 +1,2 @@
 line1
+line2
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_path, "code.rs");
    }

    #[test]
    fn no_newline_markers_are_not_content() {
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ -1 +1 @@
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].context.contains("No newline"));
        assert_eq!(chunks[0].removed_lines, vec!["old"]);
        assert_eq!(chunks[0].added_lines, vec!["new"]);
    }

    #[test]
    fn context_only_hunk_emits_nothing() {
        let diff = "\
diff --git a/f.rs b/f.rs
--- a/f.rs
+++ b/f.rs
@@ -1,2 +1,2 @@
 a
 b
";
        assert!(parse_change_chunks(diff).is_empty());
    }

    #[test]
    fn dashes_inside_hunk_budget_are_content() {
        let diff = "\
diff --git a/notes.md b/notes.md
--- a/notes.md
+++ b/notes.md
@@ -1,2 +1,2 @@
---- old rule
++++ new rule
 tail
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].removed_lines, vec!["--- old rule"]);
        assert_eq!(chunks[0].added_lines, vec!["+++ new rule"]);
    }

    #[test]
    fn blank_line_inside_budget_is_context() {
        let diff = "\
diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1,3 +1,3 @@
 first

-x
+y
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].context, " first\n \n-x\n+y\n");
    }

    #[test]
    fn malformed_hunk_header_skips_until_next_header() {
        let diff = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1,2 +1,2 @@
-a
+b
@@ nonsense @@
+ignored
@@ -9 +9 @@
-c
+d
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].added_lines, vec!["b"]);
        assert_eq!(chunks[1].start_line, 9);
        assert_eq!(chunks[1].added_lines, vec!["d"]);
    }

    #[test]
    fn header_less_patch_uses_plus_path() {
        let diff = "\
--- a/src/app.js\t2024-01-01 00:00:00
+++ b/src/app.js\t2024-01-02 00:00:00
@@ -3,2 +3,3 @@
 const a = 1;
+const b = 2;
 module.exports = a;
--- /dev/null
+++ b/src/new.ts
@@ -0,0 +1 @@
+export const x = 1;
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].file_path, "src/app.js");
        assert_eq!(chunks[0].change_type, ChangeType::Modified);
        assert_eq!(chunks[1].file_path, "src/new.ts");
        assert_eq!(chunks[1].change_type, ChangeType::Added);
    }

    #[test]
    fn quoted_paths_are_unquoted() {
        let diff = "\
diff --git \"a/src/my file.rs\" \"b/src/my file.rs\"
--- \"a/src/my file.rs\"
+++ \"b/src/my file.rs\"
@@ -1 +1,2 @@
 old
+new
";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_path, "src/my file.rs");
    }

    #[test]
    fn crlf_line_endings_are_handled() {
        let diff = "diff --git a/w.cs b/w.cs\r\n--- a/w.cs\r\n+++ b/w.cs\r\n@@ -1 +1 @@\r\n-a\r\n+b\r\n";
        let chunks = parse_change_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].added_lines, vec!["b"]);
    }

    #[test]
    fn hunk_header_parsing() {
        assert_eq!(
            parse_hunk_header("@@ -1,4 +2,5 @@ fn main()"),
            Some(HunkHeader {
                old_lines: 4,
                new_start: 2,
                new_lines: 5
            })
        );
        assert_eq!(
            parse_hunk_header("@@ -3 +3 @@"),
            Some(HunkHeader {
                old_lines: 1,
                new_start: 3,
                new_lines: 1
            })
        );
        assert!(parse_hunk_header("@@ -x +1 @@").is_none());
        assert!(parse_hunk_header("@@ -1 @@").is_none());
        assert!(parse_hunk_header("@@@ -1 +1 @@@").is_none());
    }

    #[test]
    fn git_header_path_takes_last_b_segment() {
        assert_eq!(
            parse_git_header_path("a/x b/y.rs").as_deref(),
            Some("y.rs")
        );
        assert_eq!(
            parse_git_header_path("a/dir b/x b/dir b/x").as_deref(),
            Some("x")
        );
        assert!(parse_git_header_path("garbage").is_none());
    }

    #[test]
    fn file_type_cases() {
        assert_eq!(file_type("a/b/C.Kt"), "kt");
        assert_eq!(file_type("archive.tar.gz"), "gz");
        assert_eq!(file_type("dir.d/README"), "unknown");
        assert_eq!(file_type(".env"), "unknown");
        assert_eq!(file_type("trailing."), "unknown");
    }
}
