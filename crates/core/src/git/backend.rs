//! The version-control operations the content pipeline depends on.
//!
//! Abstracted behind a trait so the cache and resolver can be driven by the
//! real `git` CLI in production and by counting fakes in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::VcsError;

/// Backend for root lookup, revision resolution, and file reads.
#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Repository root containing `path`, or `None` when it is not in a
    /// repository.
    async fn root_of(&self, path: &Path) -> Result<Option<PathBuf>, VcsError>;

    /// Canonical commit id for a symbolic revision such as `HEAD` or a
    /// branch name.
    async fn resolve(&self, revision: &str, repo_root: &Path) -> Result<String, VcsError>;

    /// Lines of `relative_path` (forward slashes) at `commit_id`.
    async fn read(
        &self,
        commit_id: &str,
        repo_root: &Path,
        relative_path: &str,
    ) -> Result<Vec<String>, VcsError>;
}
