//! Revision subcommands: file content at a revision and diffs against it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use mergelens_core::{git, LineBuffer, MergelensEngine, TextBuffer};

use crate::style;

/// Absolute form of `path`, resolving symlinks when the file exists so the
/// repository root found for it matches what git reports.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    git::absolute(path).with_context(|| format!("failed to resolve {}", path.display()))
}

/// Print `file` as it was at `revision`.
pub async fn run_show(engine: &MergelensEngine, revision: &str, file: &Path) -> Result<()> {
    let path = absolute(file)?;
    let content = engine
        .file_at_revision(revision, &path)
        .await
        .with_context(|| format!("failed to read {} at {}", file.display(), revision))?;

    for line in &content.lines {
        println!("{}", line);
    }
    Ok(())
}

/// Print change blocks of the working copy of `file` against `revision`.
pub async fn run_diff(
    engine: &MergelensEngine,
    revision: &str,
    file: &Path,
    unified: bool,
) -> Result<()> {
    let path = absolute(file)?;
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let current = LineBuffer::from_text(&text);

    let view = engine
        .diff(revision, &path, &current.lines())
        .await
        .with_context(|| format!("failed to diff {} against {}", file.display(), revision))?;

    if view.is_unchanged() {
        println!(
            "{}",
            style::success(&format!("{} matches {}", view.relative_path(), revision))
        );
        return Ok(());
    }

    if unified {
        for line in view.unified().lines() {
            println!("{}", style::patch_line(line));
        }
        return Ok(());
    }

    println!();
    println!(
        "{}",
        style::header(&format!(
            "{} against {} ({})",
            view.relative_path(),
            view.revision(),
            short_id(view.commit_id().as_str())
        ))
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Change", "Lines", "Removed"]);
    for change in view.changes() {
        let lines = if change.start_line == change.end_line {
            change.start_line.to_string()
        } else {
            format!("{}-{}", change.start_line, change.end_line)
        };
        table.add_row(vec![
            Cell::new(style::change(change.kind)),
            Cell::new(lines),
            Cell::new(change.removed),
        ]);
    }
    println!("{}", table);
    println!();
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..10).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_keeps_missing_absolute_paths() {
        let path = Path::new("/definitely/not/here/./file.txt");
        assert_eq!(
            absolute(path).unwrap(),
            PathBuf::from("/definitely/not/here/file.txt")
        );
    }

    #[test]
    fn test_absolute_canonicalizes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(absolute(&file).unwrap(), file.canonicalize().unwrap());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456789");
        assert_eq!(short_id("abc"), "abc");
    }
}
