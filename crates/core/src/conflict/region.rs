//! Conflict region types.
//!
//! Line numbers are 1-based. Content spans are half-open (`start..end`), sign
//! and marker lines are single line numbers.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identifier of a conflict region, assigned 1.. in document order per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A half-open range of 1-based line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && line < self.end
    }
}

/// Lifecycle status of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionStatus {
    Unresolved,
    Resolved,
}

impl std::fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// Line numbers of a region's marker lines.
///
/// Always ordered `start < [base] < separator < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictMarkers {
    pub start: usize,
    pub base: Option<usize>,
    pub separator: usize,
    pub end: usize,
}

/// A single conflict block found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRegion {
    pub id: RegionId,
    pub markers: ConflictMarkers,
    /// Label following `<<<<<<<`, e.g. `HEAD`.
    pub ours_label: Option<String>,
    /// Label following `|||||||` in diff3 output.
    pub base_label: Option<String>,
    /// Label following `>>>>>>>`, e.g. a branch name.
    pub theirs_label: Option<String>,
    pub status: RegionStatus,
}

impl ConflictRegion {
    /// Lines between the start marker and the base marker (or separator).
    pub fn ours(&self) -> LineSpan {
        let end = self.markers.base.unwrap_or(self.markers.separator);
        LineSpan::new(self.markers.start + 1, end)
    }

    /// Lines between the base marker and the separator, in diff3 mode.
    pub fn base(&self) -> Option<LineSpan> {
        self.markers
            .base
            .map(|base| LineSpan::new(base + 1, self.markers.separator))
    }

    /// Lines between the separator and the end marker.
    pub fn theirs(&self) -> LineSpan {
        LineSpan::new(self.markers.separator + 1, self.markers.end)
    }

    /// The whole block, marker lines included.
    pub fn span(&self) -> LineSpan {
        LineSpan::new(self.markers.start, self.markers.end + 1)
    }

    pub fn contains(&self, line: usize) -> bool {
        self.span().contains(line)
    }

    pub fn is_diff3(&self) -> bool {
        self.markers.base.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff3_region() -> ConflictRegion {
        ConflictRegion {
            id: RegionId(1),
            markers: ConflictMarkers {
                start: 3,
                base: Some(5),
                separator: 7,
                end: 10,
            },
            ours_label: Some("HEAD".into()),
            base_label: Some("merged common ancestors".into()),
            theirs_label: Some("feature".into()),
            status: RegionStatus::Unresolved,
        }
    }

    #[test]
    fn test_side_spans() {
        let region = diff3_region();
        assert_eq!(region.ours(), LineSpan::new(4, 5));
        assert_eq!(region.base(), Some(LineSpan::new(6, 7)));
        assert_eq!(region.theirs(), LineSpan::new(8, 10));
        assert_eq!(region.span(), LineSpan::new(3, 11));
        assert!(region.is_diff3());
    }

    #[test]
    fn test_contains_covers_marker_lines() {
        let region = diff3_region();
        assert!(!region.contains(2));
        assert!(region.contains(3));
        assert!(region.contains(7));
        assert!(region.contains(10));
        assert!(!region.contains(11));
    }

    #[test]
    fn test_empty_side() {
        let region = ConflictRegion {
            markers: ConflictMarkers {
                start: 1,
                base: None,
                separator: 2,
                end: 4,
            },
            ..diff3_region()
        };
        assert!(region.ours().is_empty());
        assert_eq!(region.theirs().len(), 1);
        assert_eq!(region.base(), None);
    }
}
