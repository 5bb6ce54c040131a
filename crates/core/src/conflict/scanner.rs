//! Conflict marker scanner.
//!
//! A single forward pass over the document lines drives a four-state machine
//! (`Seeking`, `InOurs`, `InBase`, `InTheirs`). Out-of-sequence markers inside
//! an open conflict abort the scan; nothing is recovered.

use tracing::debug;

use super::region::{ConflictMarkers, ConflictRegion, RegionId, RegionStatus};
use crate::errors::ScanError;

const MARKER_LEN: usize = 7;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The four conflict marker kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `<<<<<<<`
    Start,
    /// `|||||||`
    Base,
    /// `=======`
    Separator,
    /// `>>>>>>>`
    End,
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Base => write!(f, "base"),
            Self::Separator => write!(f, "separator"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Seeking,
    InOurs,
    InBase,
    InTheirs,
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seeking => write!(f, "seeking"),
            Self::InOurs => write!(f, "in ours section"),
            Self::InBase => write!(f, "in base section"),
            Self::InTheirs => write!(f, "in theirs section"),
        }
    }
}

/// A recognised marker line and its optional label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    pub kind: MarkerKind,
    pub label: Option<&'a str>,
}

/// Classify a single line as a conflict marker.
///
/// A marker is exactly seven marker characters followed by end of line or a
/// space and a label. The separator never carries a label. A trailing `\r`
/// is ignored.
pub fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let kind = match line.as_bytes().first()? {
        b'<' => MarkerKind::Start,
        b'|' => MarkerKind::Base,
        b'=' => MarkerKind::Separator,
        b'>' => MarkerKind::End,
        _ => return None,
    };
    let marker_char = line.as_bytes()[0];
    if line.len() < MARKER_LEN
        || !line.as_bytes()[..MARKER_LEN]
            .iter()
            .all(|&b| b == marker_char)
    {
        return None;
    }

    let rest = &line[MARKER_LEN..];
    if kind == MarkerKind::Separator {
        return rest.is_empty().then_some(Marker { kind, label: None });
    }
    if rest.is_empty() {
        return Some(Marker { kind, label: None });
    }
    let label = rest.strip_prefix(' ')?;
    let label = (!label.is_empty()).then_some(label);
    Some(Marker { kind, label })
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// In-progress region while the scanner is inside a conflict.
struct OpenRegion {
    start: usize,
    base: Option<usize>,
    separator: Option<usize>,
    ours_label: Option<String>,
    base_label: Option<String>,
}

/// Stateless conflict marker scanner.
pub struct MarkerScanner;

impl MarkerScanner {
    /// Scan `lines` and return every conflict region in document order.
    pub fn scan<S: AsRef<str>>(lines: &[S]) -> Result<Vec<ConflictRegion>, ScanError> {
        let mut regions = Vec::new();
        let mut state = ScanState::Seeking;
        let mut open: Option<OpenRegion> = None;

        for (index, raw) in lines.iter().enumerate() {
            let line_no = index + 1;
            let Some(marker) = parse_marker(raw.as_ref()) else {
                continue;
            };

            let unexpected = move || ScanError::UnexpectedMarker {
                line: line_no,
                marker: marker.kind,
                state,
            };

            state = match (state, marker.kind) {
                (ScanState::Seeking, MarkerKind::Start) => {
                    open = Some(OpenRegion {
                        start: line_no,
                        base: None,
                        separator: None,
                        ours_label: marker.label.map(str::to_string),
                        base_label: None,
                    });
                    ScanState::InOurs
                }
                // Stray non-start markers outside a conflict are plain text.
                (ScanState::Seeking, _) => ScanState::Seeking,
                (ScanState::InOurs, MarkerKind::Base) => {
                    let region = open.as_mut().ok_or_else(unexpected)?;
                    region.base = Some(line_no);
                    region.base_label = marker.label.map(str::to_string);
                    ScanState::InBase
                }
                (ScanState::InOurs | ScanState::InBase, MarkerKind::Separator) => {
                    let region = open.as_mut().ok_or_else(unexpected)?;
                    region.separator = Some(line_no);
                    ScanState::InTheirs
                }
                (ScanState::InTheirs, MarkerKind::End) => {
                    let region = open.take().ok_or_else(unexpected)?;
                    let separator = region.separator.ok_or_else(unexpected)?;
                    let id = RegionId(regions.len() as u32 + 1);
                    regions.push(ConflictRegion {
                        id,
                        markers: ConflictMarkers {
                            start: region.start,
                            base: region.base,
                            separator,
                            end: line_no,
                        },
                        ours_label: region.ours_label,
                        base_label: region.base_label,
                        theirs_label: marker.label.map(str::to_string),
                        status: RegionStatus::Unresolved,
                    });
                    ScanState::Seeking
                }
                _ => return Err(unexpected()),
            };
        }

        if let Some(region) = open {
            return Err(ScanError::Unterminated {
                start: region.start,
            });
        }

        debug!(count = regions.len(), "scanned conflict markers");
        Ok(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_parse_marker() {
        assert_eq!(
            parse_marker("<<<<<<< HEAD"),
            Some(Marker {
                kind: MarkerKind::Start,
                label: Some("HEAD")
            })
        );
        assert_eq!(
            parse_marker(">>>>>>>"),
            Some(Marker {
                kind: MarkerKind::End,
                label: None
            })
        );
        assert_eq!(
            parse_marker("=======\r").map(|m| m.kind),
            Some(MarkerKind::Separator)
        );
        assert_eq!(
            parse_marker("||||||| merged common ancestors").map(|m| m.kind),
            Some(MarkerKind::Base)
        );
        assert_eq!(parse_marker("<<<<<<<< eight"), None);
        assert_eq!(parse_marker("<<<<<<<HEAD"), None);
        assert_eq!(parse_marker("======= trailing"), None);
        assert_eq!(parse_marker("<<<<<<"), None);
        assert_eq!(parse_marker(""), None);
        assert_eq!(parse_marker("let x = 1;"), None);
    }

    #[test]
    fn test_scan_two_way_conflict() {
        let text = "\
fn main() {
<<<<<<< HEAD
    println!(\"ours\");
=======
    println!(\"theirs\");
>>>>>>> feature
}";
        let regions = MarkerScanner::scan(&lines(text)).unwrap();
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.id, RegionId(1));
        assert_eq!(
            region.markers,
            ConflictMarkers {
                start: 2,
                base: None,
                separator: 4,
                end: 6
            }
        );
        assert_eq!(region.ours_label.as_deref(), Some("HEAD"));
        assert_eq!(region.theirs_label.as_deref(), Some("feature"));
        assert_eq!(region.status, RegionStatus::Unresolved);
    }

    #[test]
    fn test_scan_diff3_conflict() {
        let text = "\
<<<<<<< HEAD
a
||||||| base
b
=======
c
>>>>>>> other";
        let regions = MarkerScanner::scan(&lines(text)).unwrap();
        assert_eq!(regions[0].markers.base, Some(3));
        assert_eq!(regions[0].base_label.as_deref(), Some("base"));
    }

    #[test]
    fn test_scan_multiple_regions_in_order() {
        let text = "\
<<<<<<< HEAD
a
=======
b
>>>>>>> x
middle
<<<<<<< HEAD
c
=======
d
>>>>>>> x
tail";
        let regions = MarkerScanner::scan(&lines(text)).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].id, RegionId(1));
        assert_eq!(regions[1].id, RegionId(2));
        for pair in regions.windows(2) {
            assert!(pair[0].markers.end < pair[1].markers.start);
        }
        for region in &regions {
            let m = region.markers;
            assert!(m.start < m.separator && m.separator < m.end);
        }
    }

    #[test]
    fn test_scan_without_conflicts() {
        let text = "plain\ntext\n=======\n>>>>>>> stray";
        assert!(MarkerScanner::scan(&lines(text)).unwrap().is_empty());
        let empty: Vec<&str> = Vec::new();
        assert!(MarkerScanner::scan(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_nested_start_marker_is_error() {
        let text = "\
<<<<<<< HEAD
<<<<<<< HEAD
a
=======
b
>>>>>>> x";
        let err = MarkerScanner::scan(&lines(text)).unwrap_err();
        assert_eq!(
            err,
            ScanError::UnexpectedMarker {
                line: 2,
                marker: MarkerKind::Start,
                state: ScanState::InOurs,
            }
        );
    }

    #[test]
    fn test_out_of_sequence_markers() {
        let end_in_ours = "<<<<<<< HEAD\na\n>>>>>>> x";
        assert!(matches!(
            MarkerScanner::scan(&lines(end_in_ours)),
            Err(ScanError::UnexpectedMarker {
                line: 3,
                marker: MarkerKind::End,
                ..
            })
        ));

        let base_in_theirs = "<<<<<<< HEAD\na\n=======\n||||||| base\n>>>>>>> x";
        assert!(matches!(
            MarkerScanner::scan(&lines(base_in_theirs)),
            Err(ScanError::UnexpectedMarker {
                line: 4,
                marker: MarkerKind::Base,
                state: ScanState::InTheirs,
            })
        ));

        let double_separator = "<<<<<<< HEAD\na\n=======\n=======\n>>>>>>> x";
        assert!(matches!(
            MarkerScanner::scan(&lines(double_separator)),
            Err(ScanError::UnexpectedMarker { line: 4, .. })
        ));

        let double_base = "<<<<<<< HEAD\n||||||| a\n||||||| b\n=======\n>>>>>>> x";
        assert!(matches!(
            MarkerScanner::scan(&lines(double_base)),
            Err(ScanError::UnexpectedMarker {
                line: 3,
                state: ScanState::InBase,
                ..
            })
        ));
    }

    #[test]
    fn test_unterminated_conflict() {
        let text = "ok\n<<<<<<< HEAD\na\n=======\nb";
        assert_eq!(
            MarkerScanner::scan(&lines(text)),
            Err(ScanError::Unterminated { start: 2 })
        );
    }

    #[test]
    fn test_crlf_lines() {
        let text = ["<<<<<<< HEAD\r", "a\r", "=======\r", "b\r", ">>>>>>> x\r"];
        let regions = MarkerScanner::scan(&text).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].ours_label.as_deref(), Some("HEAD"));
    }
}
