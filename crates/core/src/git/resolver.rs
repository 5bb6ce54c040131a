//! Symbolic revision to commit id resolution.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use super::backend::VcsBackend;
use crate::errors::VcsError;

/// A canonical, content-addressed commit id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns names like `HEAD`, `main`, or `v1.2~3` into commit ids.
#[derive(Clone)]
pub struct RevisionResolver {
    backend: Arc<dyn VcsBackend>,
}

impl RevisionResolver {
    pub fn new(backend: Arc<dyn VcsBackend>) -> Self {
        Self { backend }
    }

    /// Resolve `revision` inside `repo_root`.
    ///
    /// Failures always carry the backend's diagnostic text.
    pub async fn resolve(&self, revision: &str, repo_root: &Path) -> Result<CommitId, VcsError> {
        match self.backend.resolve(revision, repo_root).await {
            Ok(id) if !id.is_empty() => {
                debug!(revision, commit_id = %id, "revision resolved");
                Ok(CommitId(id))
            }
            Ok(_) => Err(VcsError::RevisionResolution {
                revision: revision.to_string(),
                diagnostic: "backend returned an empty commit id".into(),
            }),
            Err(VcsError::RevisionResolution {
                revision,
                diagnostic,
            }) if diagnostic.trim().is_empty() => {
                warn!(%revision, "revision resolution failed without diagnostic");
                Err(VcsError::RevisionResolution {
                    diagnostic: format!("unknown revision '{}'", revision),
                    revision,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct FixedBackend {
        answer: Result<String, VcsError>,
    }

    #[async_trait]
    impl VcsBackend for FixedBackend {
        async fn root_of(&self, _path: &Path) -> Result<Option<PathBuf>, VcsError> {
            Ok(None)
        }

        async fn resolve(&self, _revision: &str, _repo_root: &Path) -> Result<String, VcsError> {
            self.answer.clone()
        }

        async fn read(
            &self,
            _commit_id: &str,
            _repo_root: &Path,
            _relative_path: &str,
        ) -> Result<Vec<String>, VcsError> {
            Ok(Vec::new())
        }
    }

    fn resolver(answer: Result<String, VcsError>) -> RevisionResolver {
        RevisionResolver::new(Arc::new(FixedBackend { answer }))
    }

    #[tokio::test]
    async fn test_resolves_to_commit_id() {
        let id = resolver(Ok("0123abcd".into()))
            .resolve("HEAD", Path::new("/repo"))
            .await
            .unwrap();
        assert_eq!(id.as_str(), "0123abcd");
    }

    #[tokio::test]
    async fn test_empty_diagnostic_is_filled_in() {
        let err = resolver(Err(VcsError::RevisionResolution {
            revision: "nope".into(),
            diagnostic: String::new(),
        }))
        .resolve("nope", Path::new("/repo"))
        .await
        .unwrap_err();
        assert_eq!(err.diagnostic(), Some("unknown revision 'nope'"));
    }

    #[tokio::test]
    async fn test_empty_commit_id_is_an_error() {
        let err = resolver(Ok(String::new()))
            .resolve("HEAD", Path::new("/repo"))
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::RevisionResolution { .. }));
    }
}
