//! Assembly of the mergelens components.
//!
//! [`MergelensEngine`] is built once from a [`MergelensConfig`]: it creates
//! the `git` backend, the revision resolver, the shared content cache, and
//! the workspace of open documents. Front ends talk to the engine instead
//! of wiring the pieces themselves.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::buffer::LineBuffer;
use crate::config::MergelensConfig;
use crate::diff::DiffView;
use crate::errors::{CoreError, VcsError};
use crate::git::{ContentCache, ContentService, GitCli, RevisionFile, RevisionResolver, VcsBackend};
use crate::workspace::Workspace;

/// Conflict workspace plus revision content access.
pub struct MergelensEngine {
    config: MergelensConfig,
    content: ContentService,
    workspace: Workspace<LineBuffer>,
}

impl MergelensEngine {
    /// Build an engine that shells out to the configured `git` binary.
    pub fn from_config(config: &MergelensConfig) -> Result<Self, CoreError> {
        let backend: Arc<dyn VcsBackend> = Arc::new(GitCli::new(config.git.binary.clone()));
        Self::with_backend(config, backend)
    }

    /// Build an engine on top of an arbitrary backend.
    pub fn with_backend(
        config: &MergelensConfig,
        backend: Arc<dyn VcsBackend>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let capacity = config.cache_capacity()?;

        let resolver = RevisionResolver::new(Arc::clone(&backend));
        let cache = ContentCache::new(Arc::clone(&backend), capacity);
        let content = ContentService::new(backend, resolver, cache);

        info!(
            git = %config.git.binary,
            cache_capacity = capacity.get(),
            "initializing mergelens engine"
        );
        Ok(Self {
            config: config.clone(),
            content,
            workspace: Workspace::new(),
        })
    }

    pub fn config(&self) -> &MergelensConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub fn workspace(&self) -> &Workspace<LineBuffer> {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace<LineBuffer> {
        &mut self.workspace
    }

    /// Content of `file_path` at `revision`.
    pub async fn file_at_revision(
        &self,
        revision: &str,
        file_path: &Path,
    ) -> Result<RevisionFile, VcsError> {
        self.content.file_at_revision(revision, file_path).await
    }

    /// Diff of `current` (the working content of `file_path`) against the
    /// file at `revision`.
    pub async fn diff<S: AsRef<str>>(
        &self,
        revision: &str,
        file_path: &Path,
        current: &[S],
    ) -> Result<DiffView, VcsError> {
        let base = self.file_at_revision(revision, file_path).await?;
        Ok(DiffView::build(&base, current))
    }
}
