//! Integration Test: Separation of Concerns
//!
//! **Policy**: Markup is produced in exactly two places, the formatter
//! (message text) and the renderer (the message template). Everything else
//! in the core hands structured values around. The core crate stays free of
//! UI framework dependencies so any surface can drive it.

use std::fs;
use std::path::Path;

use architectural_enforcement::{report, scan, workspace_root};

const MARKUP_OWNERS: [&str; 2] = ["formatter.rs", "render.rs"];

const TAGS: [&str; 7] = ["<div", "<ul", "<li", "<br", "<a ", "<button", "</"];

fn builds_markup(code: &str) -> bool {
    TAGS.iter().any(|tag| code.contains(tag))
}

fn owns_markup(path: &Path) -> bool {
    MARKUP_OWNERS.iter().any(|owner| path.ends_with(owner))
}

#[test]
fn test_markup_confined_to_formatter_and_renderer() {
    let violations = scan("conductor/core/src", owns_markup, builds_markup);
    report("Markup built outside formatter.rs / render.rs", &violations);
}

#[test]
fn test_console_does_not_build_markup() {
    let violations = scan("conductor/console/src", |_| false, builds_markup);
    report("Markup built in the console surface", &violations);
}

#[test]
fn test_core_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("conductor/core/Cargo.toml"))
        .expect("core manifest readable");
    for forbidden in ["ratatui", "crossterm", "tracing-subscriber", "clap"] {
        assert!(
            !manifest.contains(forbidden),
            "conductor/core must not depend on {forbidden}"
        );
    }
}
