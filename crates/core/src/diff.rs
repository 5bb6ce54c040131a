//! Diff of a working buffer against a file at some revision.
//!
//! The line diff itself comes from `diffy`; this module only turns its hunks
//! into change blocks addressed by working-buffer line numbers, the shape a
//! sign column needs.

use serde::Serialize;

use crate::git::{CommitId, RevisionFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffChangeKind {
    /// Lines present only in the working buffer.
    Added,
    /// Lines replaced in the working buffer.
    Changed,
    /// Lines removed; anchored on the working line that follows them.
    Deleted,
}

impl std::fmt::Display for DiffChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Changed => write!(f, "changed"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// One contiguous change block, inclusive 1-based working lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffChange {
    pub kind: DiffChangeKind,
    pub start_line: usize,
    pub end_line: usize,
    /// Number of revision lines removed or replaced by this block.
    pub removed: usize,
}

/// Change blocks between a revision and the current content of a file.
#[derive(Debug, Clone)]
pub struct DiffView {
    revision: String,
    commit_id: CommitId,
    relative_path: String,
    changes: Vec<DiffChange>,
    unified: String,
}

impl DiffView {
    pub fn build<S: AsRef<str>>(base: &RevisionFile, current: &[S]) -> Self {
        let original = join_lines(&base.lines);
        let modified = join_lines(current);
        let patch = diffy::create_patch(&original, &modified);
        let changes = classify(&patch, current.len());

        Self {
            revision: base.revision.clone(),
            commit_id: base.commit_id.clone(),
            relative_path: base.relative_path.clone(),
            changes,
            unified: patch.to_string(),
        }
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn commit_id(&self) -> &CommitId {
        &self.commit_id
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn changes(&self) -> &[DiffChange] {
        &self.changes
    }

    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }

    /// The change block covering `line`, if any.
    pub fn change_at(&self, line: usize) -> Option<&DiffChange> {
        self.changes
            .iter()
            .find(|c| c.start_line <= line && line <= c.end_line)
    }

    /// Unified diff text, revision on the `-` side.
    pub fn unified(&self) -> &str {
        &self.unified
    }
}

fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    text
}

#[derive(Default)]
struct Block {
    start: usize,
    deleted: usize,
    inserted: usize,
}

impl Block {
    fn is_empty(&self) -> bool {
        self.deleted == 0 && self.inserted == 0
    }

    fn flush(&mut self, line_count: usize, out: &mut Vec<DiffChange>) {
        if self.is_empty() {
            return;
        }
        let change = if self.inserted == 0 {
            // Past the last line there is nothing to anchor on but the last line.
            let anchor = self.start.min(line_count).max(1);
            DiffChange {
                kind: DiffChangeKind::Deleted,
                start_line: anchor,
                end_line: anchor,
                removed: self.deleted,
            }
        } else {
            DiffChange {
                kind: if self.deleted == 0 {
                    DiffChangeKind::Added
                } else {
                    DiffChangeKind::Changed
                },
                start_line: self.start,
                end_line: self.start + self.inserted - 1,
                removed: self.deleted,
            }
        };
        out.push(change);
        *self = Block::default();
    }
}

fn classify(patch: &diffy::Patch<'_, str>, line_count: usize) -> Vec<DiffChange> {
    let mut changes = Vec::new();
    for hunk in patch.hunks() {
        let mut line = hunk.new_range().start().max(1);
        let mut block = Block::default();
        for entry in hunk.lines() {
            match entry {
                diffy::Line::Context(_) => {
                    block.flush(line_count, &mut changes);
                    line += 1;
                }
                diffy::Line::Delete(_) => {
                    if block.is_empty() {
                        block.start = line;
                    }
                    block.deleted += 1;
                }
                diffy::Line::Insert(_) => {
                    if block.is_empty() {
                        block.start = line;
                    }
                    block.inserted += 1;
                    line += 1;
                }
            }
        }
        block.flush(line_count, &mut changes);
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn revision_file(text: &str) -> RevisionFile {
        RevisionFile {
            revision: "HEAD".into(),
            commit_id: CommitId::new("c0ffee"),
            repo_root: PathBuf::from("/repo"),
            relative_path: "a.txt".into(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_identical_content() {
        let view = DiffView::build(&revision_file("a\nb\n"), &lines("a\nb\n"));
        assert!(view.is_unchanged());
        assert_eq!(view.unified().lines().filter(|l| l.starts_with('@')).count(), 0);
    }

    #[test]
    fn test_changed_and_added_blocks() {
        let view = DiffView::build(&revision_file("a\nb\nc\n"), &lines("a\nB\nc\nd\n"));
        assert_eq!(
            view.changes(),
            &[
                DiffChange {
                    kind: DiffChangeKind::Changed,
                    start_line: 2,
                    end_line: 2,
                    removed: 1,
                },
                DiffChange {
                    kind: DiffChangeKind::Added,
                    start_line: 4,
                    end_line: 4,
                    removed: 0,
                },
            ]
        );
        assert_eq!(view.change_at(4).map(|c| c.kind), Some(DiffChangeKind::Added));
        assert!(view.change_at(3).is_none());
        assert!(view.unified().contains("-b"));
        assert!(view.unified().contains("+B"));
    }

    #[test]
    fn test_deleted_block_anchors_on_following_line() {
        let view = DiffView::build(&revision_file("a\nb\nc\n"), &lines("a\nc\n"));
        assert_eq!(
            view.changes(),
            &[DiffChange {
                kind: DiffChangeKind::Deleted,
                start_line: 2,
                end_line: 2,
                removed: 1,
            }]
        );
    }

    #[test]
    fn test_deleted_tail_anchors_on_last_line() {
        let view = DiffView::build(&revision_file("a\nb\n"), &lines("a\n"));
        assert_eq!(view.changes().len(), 1);
        assert_eq!(view.changes()[0].kind, DiffChangeKind::Deleted);
        assert_eq!(view.changes()[0].start_line, 1);
    }

    #[test]
    fn test_everything_deleted_clamps_to_first_line() {
        let view = DiffView::build(&revision_file("a\nb\n"), &Vec::<String>::new());
        assert_eq!(view.changes().len(), 1);
        assert_eq!(view.changes()[0].start_line, 1);
        assert_eq!(view.changes()[0].removed, 2);
    }

    #[test]
    fn test_metadata_carried_over() {
        let view = DiffView::build(&revision_file("a\n"), &lines("a\n"));
        assert_eq!(view.revision(), "HEAD");
        assert_eq!(view.commit_id().as_str(), "c0ffee");
        assert_eq!(view.relative_path(), "a.txt");
    }
}
