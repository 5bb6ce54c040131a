//! Open documents and the editor-facing action interface.
//!
//! A [`Workspace`] owns one [`DocumentSession`] per open document (buffer,
//! conflict registry, sign state) and a single [`ResolutionExecutor`] shared
//! by every document, so "repeat last resolution" works across files.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buffer::TextBuffer;
use crate::conflict::navigation::NavigationController;
use crate::conflict::registry::ConflictRegistry;
use crate::conflict::resolver::{
    ActionKind, RegionSelector, RepeatableAction, Resolution, ResolutionExecutor,
};
use crate::conflict::scanner::MarkerScanner;
use crate::conflict::signs::{SignDelta, SignDescriptor, SignPresenter};
use crate::conflict::ConflictRegion;
use crate::errors::{CoreError, RegionError, ScanError};

// ---------------------------------------------------------------------------
// Document identity
// ---------------------------------------------------------------------------

/// Identity of an open document, typically its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&Path> for DocumentId {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Buffer, region registry, and sign state of one open document.
#[derive(Debug)]
pub struct DocumentSession<B> {
    buffer: B,
    registry: ConflictRegistry,
    signs: SignPresenter,
}

impl<B: TextBuffer> DocumentSession<B> {
    /// Scan `buffer` and build its first registry.
    pub fn open(buffer: B) -> Result<(Self, SignDelta), ScanError> {
        Self::open_with_signs(buffer, SignPresenter::new())
    }

    /// Scan `buffer` and diff its signs against those already in `signs`.
    fn open_with_signs(buffer: B, signs: SignPresenter) -> Result<(Self, SignDelta), ScanError> {
        let regions = MarkerScanner::scan(&buffer.lines())?;
        let mut session = Self {
            buffer,
            registry: ConflictRegistry::new(),
            signs,
        };
        session.registry.replace_all(regions);
        let delta = session.signs.refresh(&session.registry);
        Ok((session, delta))
    }

    /// Rebuild the registry from the buffer. On a scan error the previous
    /// regions and signs stay in place.
    pub fn rescan(&mut self) -> Result<SignDelta, ScanError> {
        let regions = MarkerScanner::scan(&self.buffer.lines())?;
        self.registry.replace_all(regions);
        Ok(self.signs.refresh(&self.registry))
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Mutable buffer access. Call [`rescan`](Self::rescan) after editing.
    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    pub fn registry(&self) -> &ConflictRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ConflictRegistry {
        &mut self.registry
    }

    pub fn signs(&self) -> &[SignDescriptor] {
        self.signs.current()
    }

    pub fn summary(&self) -> ConflictSummary {
        let regions = self.registry.regions();
        ConflictSummary {
            total: regions.len(),
            with_base: regions.iter().filter(|r| r.is_diff3()).count(),
            first_line: regions.first().map(|r| r.markers.start),
        }
    }

    pub fn into_buffer(self) -> B {
        self.buffer
    }
}

/// Conflict counts for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConflictSummary {
    pub total: usize,
    /// Regions carrying a diff3 base section.
    pub with_base: usize,
    pub first_line: Option<usize>,
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// All open documents plus the shared resolution history.
#[derive(Debug)]
pub struct Workspace<B> {
    sessions: HashMap<DocumentId, DocumentSession<B>>,
    executor: ResolutionExecutor,
}

impl<B> Default for Workspace<B> {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
            executor: ResolutionExecutor::new(),
        }
    }
}

impl<B: TextBuffer> Workspace<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or reopen) a document. A scan error leaves the workspace as it
    /// was, including any earlier session for the same document.
    ///
    /// Reopening diffs the new signs against the ones already shown, so
    /// unchanged ranges appear in neither list of the delta.
    pub fn open(&mut self, doc: impl Into<DocumentId>, buffer: B) -> Result<SignDelta, ScanError> {
        let doc = doc.into();
        let signs = self
            .sessions
            .get(&doc)
            .map(|previous| previous.signs.clone())
            .unwrap_or_default();
        let (session, delta) = DocumentSession::open_with_signs(buffer, signs).map_err(|e| {
            warn!(document = %doc, error = %e, "conflict scan failed");
            e
        })?;
        info!(
            document = %doc,
            conflicts = session.registry().len(),
            "opened document"
        );
        self.sessions.insert(doc, session);
        Ok(delta)
    }

    /// Rescan after the caller edited the buffer.
    pub fn rescan(&mut self, doc: &DocumentId) -> Result<SignDelta, CoreError> {
        Ok(self.session_mut(doc)?.rescan()?)
    }

    /// Close a document, dropping its registry. Returns the buffer.
    pub fn close(&mut self, doc: &DocumentId) -> Option<B> {
        let session = self.sessions.remove(doc)?;
        debug!(document = %doc, "closed document");
        Some(session.into_buffer())
    }

    pub fn is_open(&self, doc: &DocumentId) -> bool {
        self.sessions.contains_key(doc)
    }

    pub fn documents(&self) -> impl Iterator<Item = &DocumentId> {
        self.sessions.keys()
    }

    pub fn session(&self, doc: &DocumentId) -> Result<&DocumentSession<B>, RegionError> {
        self.sessions
            .get(doc)
            .ok_or_else(|| RegionError::UnknownDocument(doc.to_string()))
    }

    pub fn session_mut(
        &mut self,
        doc: &DocumentId,
    ) -> Result<&mut DocumentSession<B>, RegionError> {
        self.sessions
            .get_mut(doc)
            .ok_or_else(|| RegionError::UnknownDocument(doc.to_string()))
    }

    pub fn buffer(&self, doc: &DocumentId) -> Result<&B, RegionError> {
        Ok(self.session(doc)?.buffer())
    }

    pub fn regions(&self, doc: &DocumentId) -> Result<&[ConflictRegion], RegionError> {
        Ok(self.session(doc)?.registry().regions())
    }

    pub fn signs(&self, doc: &DocumentId) -> Result<&[SignDescriptor], RegionError> {
        Ok(self.session(doc)?.signs())
    }

    pub fn summary(&self, doc: &DocumentId) -> Result<ConflictSummary, RegionError> {
        Ok(self.session(doc)?.summary())
    }

    pub fn last_action(&self) -> Option<&RepeatableAction> {
        self.executor.last_action()
    }

    // -- actions ------------------------------------------------------------

    pub fn accept_current(
        &mut self,
        doc: &DocumentId,
        cursor_line: usize,
    ) -> Result<Resolution, CoreError> {
        self.resolve(doc, ActionKind::AcceptCurrent, RegionSelector::AtLine(cursor_line))
    }

    pub fn accept_incoming(
        &mut self,
        doc: &DocumentId,
        cursor_line: usize,
    ) -> Result<Resolution, CoreError> {
        self.resolve(doc, ActionKind::AcceptIncoming, RegionSelector::AtLine(cursor_line))
    }

    pub fn accept_both(
        &mut self,
        doc: &DocumentId,
        cursor_line: usize,
    ) -> Result<Resolution, CoreError> {
        self.resolve(doc, ActionKind::AcceptBoth, RegionSelector::AtLine(cursor_line))
    }

    pub fn discard(
        &mut self,
        doc: &DocumentId,
        cursor_line: usize,
    ) -> Result<Resolution, CoreError> {
        self.resolve(doc, ActionKind::Discard, RegionSelector::AtLine(cursor_line))
    }

    pub fn repeat_last(
        &mut self,
        doc: &DocumentId,
        cursor_line: usize,
    ) -> Result<Resolution, CoreError> {
        let session = self
            .sessions
            .get_mut(doc)
            .ok_or_else(|| RegionError::UnknownDocument(doc.to_string()))?;
        self.executor.repeat_last(session, cursor_line)
    }

    /// Apply `kind` to the region picked by `selector`.
    pub fn resolve(
        &mut self,
        doc: &DocumentId,
        kind: ActionKind,
        selector: RegionSelector,
    ) -> Result<Resolution, CoreError> {
        let session = self
            .sessions
            .get_mut(doc)
            .ok_or_else(|| RegionError::UnknownDocument(doc.to_string()))?;
        self.executor.apply(session, kind, selector)
    }

    /// Start line of the next conflict after `cursor_line`, wrapping.
    pub fn navigate_next(
        &self,
        doc: &DocumentId,
        cursor_line: usize,
    ) -> Result<Option<usize>, RegionError> {
        let regions = self.regions(doc)?;
        Ok(NavigationController::next(regions, cursor_line).map(|r| r.markers.start))
    }

    /// Start line of the previous conflict before `cursor_line`, wrapping.
    pub fn navigate_prev(
        &self,
        doc: &DocumentId,
        cursor_line: usize,
    ) -> Result<Option<usize>, RegionError> {
        let regions = self.regions(doc)?;
        Ok(NavigationController::prev(regions, cursor_line).map(|r| r.markers.start))
    }
}
