//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code
//! - Markup is only built by the formatter and the renderer
//! - The core crate carries no UI framework dependencies
//!
//! These tests are designed to catch violations early in the development cycle.
//! The helpers here walk the workspace sources and hand back production lines,
//! leaving out comments and `#[cfg(test)]` modules.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, resolved from this package's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// A source line that tripped a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the line
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Every `.rs` file under `dir` (relative to the workspace root)
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Production lines of a file as `(line_number, code)`
///
/// Comment-only lines are skipped, trailing `//` comments are cut, and
/// scanning stops at the first `#[cfg(test)]`.
pub fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        if trimmed.starts_with("//") {
            continue;
        }
        let code = strip_line_comment(line);
        if !code.trim().is_empty() {
            lines.push((idx + 1, code.to_string()));
        }
    }
    lines
}

/// Cut a trailing `//` comment, ignoring `//` inside string literals such as URLs
fn strip_line_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut prev = '\0';
    for (i, c) in line.char_indices() {
        match c {
            '"' if prev != '\\' => in_string = !in_string,
            '/' if !in_string && prev == '/' => return &line[..i - 1],
            _ => {}
        }
        prev = c;
    }
    line
}

/// Scan production lines under `dir` with `check`, skipping files `skip` accepts
pub fn scan<F, S>(dir: &str, skip: S, check: F) -> Vec<Violation>
where
    F: Fn(&str) -> bool,
    S: Fn(&Path) -> bool,
{
    let mut violations = Vec::new();
    for path in rust_files(dir) {
        if skip(&path) {
            continue;
        }
        for (line, code) in production_lines(&path) {
            if check(&code) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: code.trim().to_string(),
                });
            }
        }
    }
    violations
}

/// Panic with a readable report if there are violations
pub fn report(title: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!(
        "\nFound {} violation(s): {title}.\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_comment_keeps_urls() {
        assert_eq!(
            strip_line_comment(r#"let url = "http://x"; // trailing"#),
            r#"let url = "http://x"; "#
        );
        assert_eq!(strip_line_comment("let a = 1;"), "let a = 1;");
    }

    #[test]
    fn test_core_sources_found() {
        let files = rust_files("conductor/core/src");
        assert!(files.iter().any(|p| p.ends_with("conductor.rs")));
    }
}
