//! Conflict resolution actions.
//!
//! The [`ResolutionExecutor`] applies the four resolution actions to a
//! document session: accept ours, accept theirs, accept both, or discard the
//! whole block. It also remembers the last successful action so it can be
//! replayed against whichever conflict is under the cursor.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::region::{ConflictRegion, LineSpan, RegionId, RegionStatus};
use super::scanner::{parse_marker, MarkerKind};
use super::signs::SignDelta;
use crate::buffer::TextBuffer;
use crate::errors::{CoreError, RegionError};
use crate::workspace::DocumentSession;

/// Named resolution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Keep the ours (current) side.
    AcceptCurrent,
    /// Keep the theirs (incoming) side.
    AcceptIncoming,
    /// Keep ours followed by theirs. The base section is dropped.
    AcceptBoth,
    /// Remove the whole block.
    Discard,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AcceptCurrent => write!(f, "accept_current"),
            Self::AcceptIncoming => write!(f, "accept_incoming"),
            Self::AcceptBoth => write!(f, "accept_both"),
            Self::Discard => write!(f, "discard"),
        }
    }
}

/// How an action picked its target region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSelector {
    /// The region covering a cursor line.
    AtLine(usize),
    /// A region id from the current scan.
    ById(RegionId),
}

/// The last successful action, kept for `repeat_last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatableAction {
    pub kind: ActionKind,
    pub selector: RegionSelector,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The region as it was before the edit, now marked resolved.
    pub region: ConflictRegion,
    pub kind: ActionKind,
    /// Lines written in place of the conflict block.
    pub replacement: Vec<String>,
    /// Sign changes caused by the post-edit rescan.
    pub signs: SignDelta,
}

/// Applies resolution actions and remembers the last one.
#[derive(Debug, Default)]
pub struct ResolutionExecutor {
    last: Option<RepeatableAction>,
}

impl ResolutionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_action(&self) -> Option<&RepeatableAction> {
        self.last.as_ref()
    }

    pub fn accept_current<B: TextBuffer>(
        &mut self,
        session: &mut DocumentSession<B>,
        selector: RegionSelector,
    ) -> Result<Resolution, CoreError> {
        self.apply(session, ActionKind::AcceptCurrent, selector)
    }

    pub fn accept_incoming<B: TextBuffer>(
        &mut self,
        session: &mut DocumentSession<B>,
        selector: RegionSelector,
    ) -> Result<Resolution, CoreError> {
        self.apply(session, ActionKind::AcceptIncoming, selector)
    }

    pub fn accept_both<B: TextBuffer>(
        &mut self,
        session: &mut DocumentSession<B>,
        selector: RegionSelector,
    ) -> Result<Resolution, CoreError> {
        self.apply(session, ActionKind::AcceptBoth, selector)
    }

    pub fn discard<B: TextBuffer>(
        &mut self,
        session: &mut DocumentSession<B>,
        selector: RegionSelector,
    ) -> Result<Resolution, CoreError> {
        self.apply(session, ActionKind::Discard, selector)
    }

    /// Replay the last action kind on the region under `cursor_line`.
    pub fn repeat_last<B: TextBuffer>(
        &mut self,
        session: &mut DocumentSession<B>,
        cursor_line: usize,
    ) -> Result<Resolution, CoreError> {
        let last = self.last.ok_or(RegionError::NothingToRepeat)?;
        debug!(kind = %last.kind, cursor_line, "repeating last resolution");
        self.apply(session, last.kind, RegionSelector::AtLine(cursor_line))
    }

    /// Resolve one region with `kind`.
    ///
    /// Replaces the block from its start marker to its end marker in a single
    /// edit, drops the region, then rescans the whole buffer so later regions
    /// pick up their shifted line numbers.
    pub fn apply<B: TextBuffer>(
        &mut self,
        session: &mut DocumentSession<B>,
        kind: ActionKind,
        selector: RegionSelector,
    ) -> Result<Resolution, CoreError> {
        let region = select(session, selector)?.clone();
        verify_markers(&region, session.buffer())?;

        let replacement = replacement_lines(kind, &region, session.buffer())?;
        let m = region.markers;
        session
            .buffer_mut()
            .replace_lines(m.start, m.end, &replacement)?;

        let mut resolved = session.registry_mut().remove(region.id)?;
        resolved.status = RegionStatus::Resolved;
        self.last = Some(RepeatableAction { kind, selector });

        let signs = session.rescan()?;
        info!(
            region_id = %resolved.id,
            %kind,
            start = m.start,
            end = m.end,
            kept = replacement.len(),
            "conflict resolved"
        );

        Ok(Resolution {
            region: resolved,
            kind,
            replacement,
            signs,
        })
    }
}

fn select<B: TextBuffer>(
    session: &DocumentSession<B>,
    selector: RegionSelector,
) -> Result<&ConflictRegion, RegionError> {
    match selector {
        RegionSelector::AtLine(line) => session
            .registry()
            .find_at(line)
            .ok_or(RegionError::NoConflictAt(line)),
        RegionSelector::ById(id) => session
            .registry()
            .find_by_id(id)
            .ok_or(RegionError::NotFound(id)),
    }
}

/// Check the buffer still has the region's markers where the scan saw them.
fn verify_markers<B: TextBuffer>(region: &ConflictRegion, buffer: &B) -> Result<(), RegionError> {
    let m = region.markers;
    let expected = [
        Some((m.start, MarkerKind::Start)),
        m.base.map(|line| (line, MarkerKind::Base)),
        Some((m.separator, MarkerKind::Separator)),
        Some((m.end, MarkerKind::End)),
    ];
    let intact = expected.iter().flatten().all(|&(line, kind)| {
        buffer
            .line(line)
            .and_then(parse_marker)
            .is_some_and(|marker| marker.kind == kind)
    });
    if intact {
        Ok(())
    } else {
        Err(RegionError::Stale(region.id))
    }
}

/// The lines that replace the conflict block for `kind`.
pub fn replacement_lines<B: TextBuffer>(
    kind: ActionKind,
    region: &ConflictRegion,
    buffer: &B,
) -> Result<Vec<String>, RegionError> {
    let spans = match kind {
        ActionKind::AcceptCurrent => vec![region.ours()],
        ActionKind::AcceptIncoming => vec![region.theirs()],
        ActionKind::AcceptBoth => vec![region.ours(), region.theirs()],
        ActionKind::Discard => Vec::new(),
    };
    let mut lines = Vec::new();
    for span in spans {
        lines.extend(span_lines(region.id, span, buffer)?);
    }
    Ok(lines)
}

fn span_lines<B: TextBuffer>(
    id: RegionId,
    span: LineSpan,
    buffer: &B,
) -> Result<Vec<String>, RegionError> {
    (span.start..span.end)
        .map(|line| {
            buffer
                .line(line)
                .map(str::to_string)
                .ok_or(RegionError::Stale(id))
        })
        .collect()
}
