//! Shared styling utilities for CLI output.

use console::Style;

use mergelens_core::conflict::SignCategory;
use mergelens_core::diff::DiffChangeKind;

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold, white).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

/// Colored label for a conflict section.
pub fn category(category: SignCategory) -> String {
    let (style, label) = match category {
        SignCategory::Ours => (Style::new().green().bold(), "ours"),
        SignCategory::Base => (Style::new().magenta().bold(), "base"),
        SignCategory::Theirs => (Style::new().blue().bold(), "theirs"),
    };
    style.apply_to(label).to_string()
}

/// Colored label for a diff change block.
pub fn change(kind: DiffChangeKind) -> String {
    let style = match kind {
        DiffChangeKind::Added => Style::new().green(),
        DiffChangeKind::Changed => Style::new().yellow(),
        DiffChangeKind::Deleted => Style::new().red(),
    };
    style.apply_to(kind.to_string()).to_string()
}

/// Color one line of unified diff output.
pub fn patch_line(line: &str) -> String {
    let style = if line.starts_with("+++") || line.starts_with("---") {
        Style::new().bold()
    } else if line.starts_with('+') {
        Style::new().green()
    } else if line.starts_with('-') {
        Style::new().red()
    } else if line.starts_with("@@") {
        Style::new().cyan()
    } else {
        Style::new()
    };
    style.apply_to(line).to_string()
}
