//! Conflict-marker subcommands: list, resolve, navigate, signs.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use mergelens_core::conflict::{ActionKind, ConflictRegion, RegionSelector, Resolution};
use mergelens_core::workspace::DocumentId;
use mergelens_core::{LineBuffer, MergelensEngine};

use crate::style;

/// Read `path` and open it in the engine's workspace.
fn open_document(engine: &mut MergelensEngine, path: &Path) -> Result<DocumentId> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = DocumentId::from(path);
    engine
        .workspace_mut()
        .open(doc.clone(), LineBuffer::from_text(&text))
        .with_context(|| format!("failed to parse conflict markers in {}", path.display()))?;
    Ok(doc)
}

fn label(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("—")
}

fn side(name: &Option<String>, lines: usize) -> String {
    format!("{} ({} lines)", label(name), lines)
}

/// List the conflict regions of a file.
pub fn run_list(engine: &mut MergelensEngine, path: &Path) -> Result<()> {
    let doc = open_document(engine, path)?;
    let workspace = engine.workspace();
    let regions = workspace.regions(&doc)?;

    if regions.is_empty() {
        println!("{}", style::success(&format!("No conflicts in {}", path.display())));
        return Ok(());
    }

    let summary = workspace.summary(&doc)?;
    println!();
    println!(
        "{}",
        style::header(&format!("Conflicts in {} ({})", path.display(), summary.total))
    );
    if summary.with_base > 0 {
        println!("{}", style::dim(&format!("{} with a base section", summary.with_base)));
    }
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Lines", "Ours", "Base", "Theirs"]);

    for region in regions {
        table.add_row(region_row(region));
    }

    println!("{}", table);
    println!();
    Ok(())
}

fn region_row(region: &ConflictRegion) -> Vec<Cell> {
    let base = match region.base() {
        Some(span) => side(&region.base_label, span.len()),
        None => "—".to_string(),
    };
    vec![
        Cell::new(region.id),
        Cell::new(format!("{}-{}", region.markers.start, region.markers.end)),
        Cell::new(side(&region.ours_label, region.ours().len())),
        Cell::new(base),
        Cell::new(side(&region.theirs_label, region.theirs().len())),
    ]
}

/// Resolve one conflict (or, with `all`, every conflict) and return the
/// resolutions in the order they were applied.
///
/// With `all`, the first action goes to `line` (or the first conflict) and
/// is then repeated on each remaining conflict.
pub fn resolve_file(
    engine: &mut MergelensEngine,
    path: &Path,
    kind: ActionKind,
    line: Option<usize>,
    all: bool,
) -> Result<Vec<Resolution>> {
    let doc = open_document(engine, path)?;
    let workspace = engine.workspace_mut();

    let first_line = match line {
        Some(line) => line,
        None => workspace
            .navigate_next(&doc, 0)?
            .with_context(|| format!("no conflicts in {}", path.display()))?,
    };

    let mut resolutions = vec![workspace.resolve(&doc, kind, RegionSelector::AtLine(first_line))?];
    if all {
        while let Some(start) = workspace.navigate_next(&doc, 0)? {
            resolutions.push(workspace.repeat_last(&doc, start)?);
        }
    }

    let buffer = workspace
        .close(&doc)
        .context("document closed while resolving")?;
    std::fs::write(path, buffer.to_text())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(resolutions)
}

pub fn run_resolve(
    engine: &mut MergelensEngine,
    path: &Path,
    kind: ActionKind,
    line: Option<usize>,
    all: bool,
) -> Result<()> {
    let resolutions = resolve_file(engine, path, kind, line, all)?;
    for resolution in &resolutions {
        println!(
            "{}",
            style::success(&format!(
                "Conflict at lines {}-{} resolved ({}, {} lines kept)",
                resolution.region.markers.start,
                resolution.region.markers.end,
                resolution.kind,
                resolution.replacement.len()
            ))
        );
    }

    // Re-read to report what is left.
    let doc = open_document(engine, path)?;
    let remaining = engine.workspace().summary(&doc)?.total;
    if remaining > 0 {
        println!("{}", style::warn(&format!("{} conflict(s) remaining", remaining)));
    }
    Ok(())
}

/// Print the start line of the next (or previous) conflict from `line`.
pub fn run_navigate(
    engine: &mut MergelensEngine,
    path: &Path,
    line: usize,
    forward: bool,
) -> Result<()> {
    let doc = open_document(engine, path)?;
    let workspace = engine.workspace();
    let target = if forward {
        workspace.navigate_next(&doc, line)?
    } else {
        workspace.navigate_prev(&doc, line)?
    };

    match target {
        Some(target) => println!("{}", target),
        None => eprintln!("{}", style::dim(&format!("No conflicts in {}", path.display()))),
    }
    Ok(())
}

/// Print sign descriptors for every conflict section.
pub fn run_signs(engine: &mut MergelensEngine, path: &Path, json: bool) -> Result<()> {
    let doc = open_document(engine, path)?;
    let signs = engine.workspace().signs(&doc)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(signs).context("failed to serialize signs")?;
        println!("{}", rendered);
        return Ok(());
    }

    if signs.is_empty() {
        println!("{}", style::success(&format!("No conflicts in {}", path.display())));
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Section", "Start", "End"]);
    for sign in signs {
        table.add_row(vec![
            Cell::new(sign.region_id),
            Cell::new(style::category(sign.category)),
            Cell::new(sign.start_line),
            Cell::new(sign.end_line),
        ]);
    }
    println!("{}", table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergelens_core::MergelensConfig;

    const TWO_CONFLICTS: &str = "\
header
<<<<<<< HEAD
mine
=======
theirs
>>>>>>> feature
middle
<<<<<<< HEAD
mine 2
||||||| base
original
=======
theirs 2
>>>>>>> feature
footer
";

    fn engine() -> MergelensEngine {
        MergelensEngine::from_config(&MergelensConfig::default()).unwrap()
    }

    fn write_fixture(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("conflicted.txt");
        std::fs::write(&path, TWO_CONFLICTS).unwrap();
        path
    }

    #[test]
    fn test_resolve_single_conflict_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let mut engine = engine();

        let resolutions =
            resolve_file(&mut engine, &path, ActionKind::AcceptIncoming, Some(3), false).unwrap();
        assert_eq!(resolutions.len(), 1);
        assert_eq!(resolutions[0].replacement, vec!["theirs"]);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("header\ntheirs\nmiddle\n<<<<<<< HEAD\n"));
        assert!(text.ends_with("footer\n"));
    }

    #[test]
    fn test_resolve_all_repeats_action() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let mut engine = engine();

        let resolutions =
            resolve_file(&mut engine, &path, ActionKind::AcceptBoth, None, true).unwrap();
        assert_eq!(resolutions.len(), 2);
        assert!(resolutions.iter().all(|r| r.kind == ActionKind::AcceptBoth));

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "header\nmine\ntheirs\nmiddle\nmine 2\ntheirs 2\nfooter\n"
        );
    }

    #[test]
    fn test_resolve_line_outside_conflict_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let mut engine = engine();

        let result = resolve_file(&mut engine, &path, ActionKind::Discard, Some(1), false);
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TWO_CONFLICTS);
    }

    #[test]
    fn test_unterminated_conflict_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, "<<<<<<< HEAD\nmine\n=======\n").unwrap();
        let mut engine = engine();

        let err = run_list(&mut engine, &path).unwrap_err();
        assert!(format!("{:#}", err).contains("never closed"));
    }
}
