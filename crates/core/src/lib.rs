//! mergelens core library.
//!
//! This crate provides conflict-marker scanning and resolution for text
//! buffers, sign descriptors for rendering conflict sections, and an
//! asynchronous, deduplicating cache of file content at version-control
//! revisions used to build diff views.

pub mod buffer;
pub mod config;
pub mod conflict;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod git;
pub mod workspace;

// Re-exports for convenience.
pub use buffer::{LineBuffer, TextBuffer};
pub use config::MergelensConfig;
pub use diff::{DiffChange, DiffChangeKind, DiffView};
pub use engine::MergelensEngine;
pub use errors::CoreError;
pub use git::{ContentCache, ContentService, GitCli, RevisionResolver, VcsBackend};
pub use workspace::{DocumentId, Workspace};
