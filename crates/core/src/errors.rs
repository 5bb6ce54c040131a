//! Error types for the mergelens core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

use crate::conflict::scanner::{MarkerKind, ScanState};
use crate::conflict::RegionId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

/// Errors from parsing conflict markers out of a document.
///
/// A scan error is never recovered from: the caller keeps whatever region
/// set it had before the scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A marker appeared out of sequence inside an open conflict.
    #[error("unexpected {marker} marker at line {line} while {state}")]
    UnexpectedMarker {
        line: usize,
        marker: MarkerKind,
        state: ScanState,
    },

    /// The document ended before the conflict opened at `start` was closed.
    #[error("conflict opened at line {start} is never closed")]
    Unterminated { start: usize },
}

impl ScanError {
    /// The line the scanner stopped at.
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedMarker { line, .. } => *line,
            Self::Unterminated { start } => *start,
        }
    }
}

// ---------------------------------------------------------------------------
// Region errors
// ---------------------------------------------------------------------------

/// Errors from region lookup and resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    /// The region id no longer exists (already resolved or rescanned).
    #[error("conflict region {0} not found")]
    NotFound(RegionId),

    /// No conflict region covers the given line.
    #[error("no conflict at line {0}")]
    NoConflictAt(usize),

    /// The buffer no longer carries the region's marker lines.
    #[error("conflict region {0} is stale, rescan the document")]
    Stale(RegionId),

    /// `repeat_last` was requested before any resolution ran.
    #[error("no resolution action to repeat")]
    NothingToRepeat,

    /// The document is not open in the workspace.
    #[error("document '{0}' is not open")]
    UnknownDocument(String),
}

// ---------------------------------------------------------------------------
// Buffer errors
// ---------------------------------------------------------------------------

/// Errors from text buffer mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The requested line range does not fit the buffer.
    #[error("line range {start}..={end} is outside the buffer ({line_count} lines)")]
    OutOfRange {
        start: usize,
        end: usize,
        line_count: usize,
    },
}

// ---------------------------------------------------------------------------
// Version-control errors
// ---------------------------------------------------------------------------

/// Errors from the version-control backend.
///
/// `Clone` so a single fetch result can be delivered to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VcsError {
    /// A revision name could not be canonicalized.
    #[error("cannot resolve revision '{revision}': {diagnostic}")]
    RevisionResolution {
        revision: String,
        diagnostic: String,
    },

    /// A file could not be read at the given revision.
    #[error("cannot read '{path}' at {revision}: {diagnostic}")]
    ContentRead {
        revision: String,
        path: String,
        diagnostic: String,
    },

    /// A relative path could not be anchored to the current directory.
    #[error("cannot make '{path}' absolute: {detail}")]
    InvalidPath { path: String, detail: String },

    /// The path is not inside a repository.
    #[error("not a repository: {0}")]
    NotARepository(String),

    /// The VCS binary was not found on `$PATH`.
    #[error("vcs binary not found: {0}")]
    BinaryNotFound(String),

    /// The VCS process could not be spawned or waited on.
    #[error("failed to run {program}: {detail}")]
    Spawn { program: String, detail: String },

    /// The task fetching a result went away before delivering it.
    #[error("content fetch for '{0}' was aborted")]
    FetchAborted(String),
}

impl VcsError {
    /// The backend's diagnostic text, when the error carries one.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::RevisionResolution { diagnostic, .. } | Self::ContentRead { diagnostic, .. } => {
                Some(diagnostic)
            }
            Self::Spawn { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading or writing the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
