//! File content at a revision: root lookup, resolution, then a cached read.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument};

use super::backend::VcsBackend;
use super::cache::ContentCache;
use super::path::{absolute, normalize_path};
use super::resolver::{CommitId, RevisionResolver};
use crate::errors::VcsError;

/// A file as it existed at some revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFile {
    /// The name the caller asked for, e.g. `HEAD~1`.
    pub revision: String,
    pub commit_id: CommitId,
    pub repo_root: PathBuf,
    pub relative_path: String,
    pub lines: Vec<String>,
}

/// Fetches revision content for files in any repository.
#[derive(Clone)]
pub struct ContentService {
    backend: Arc<dyn VcsBackend>,
    resolver: RevisionResolver,
    cache: ContentCache,
}

impl ContentService {
    pub fn new(
        backend: Arc<dyn VcsBackend>,
        resolver: RevisionResolver,
        cache: ContentCache,
    ) -> Self {
        Self {
            backend,
            resolver,
            cache,
        }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Repository root for `file_path`, failing when there is none.
    pub async fn repository_root(&self, file_path: &Path) -> Result<PathBuf, VcsError> {
        self.backend
            .root_of(file_path)
            .await?
            .ok_or_else(|| VcsError::NotARepository(file_path.display().to_string()))
    }

    /// Content of `file_path` at `revision_name`.
    ///
    /// A relative `file_path` is taken from the current directory.
    #[instrument(skip(self, file_path), fields(path = %file_path.display()))]
    pub async fn file_at_revision(
        &self,
        revision_name: &str,
        file_path: &Path,
    ) -> Result<RevisionFile, VcsError> {
        let anchored = absolute(file_path).map_err(|e| VcsError::InvalidPath {
            path: file_path.display().to_string(),
            detail: e.to_string(),
        })?;
        let file_path = anchored.as_path();
        let repo_root = self.repository_root(file_path).await?;
        let commit_id = self.resolver.resolve(revision_name, &repo_root).await?;
        let relative_path = normalize_path(&repo_root, file_path);
        let lines = self
            .cache
            .get(commit_id.as_str(), &repo_root, &relative_path)
            .await?;

        info!(
            revision = revision_name,
            commit_id = %commit_id,
            relative_path = %relative_path,
            lines = lines.len(),
            "fetched file at revision"
        );
        Ok(RevisionFile {
            revision: revision_name.to_string(),
            commit_id,
            repo_root,
            relative_path,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRepo {
        root: Option<PathBuf>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl VcsBackend for FakeRepo {
        async fn root_of(&self, path: &Path) -> Result<Option<PathBuf>, VcsError> {
            Ok(self
                .root
                .clone()
                .filter(|root| path.is_absolute() && path.starts_with(root)))
        }

        async fn resolve(&self, revision: &str, _repo_root: &Path) -> Result<String, VcsError> {
            match revision {
                "HEAD" | "main" => Ok("c0ffee".into()),
                other => Err(VcsError::RevisionResolution {
                    revision: other.into(),
                    diagnostic: format!("fatal: Needed a single revision: {}", other),
                }),
            }
        }

        async fn read(
            &self,
            commit_id: &str,
            _repo_root: &Path,
            relative_path: &str,
        ) -> Result<Vec<String>, VcsError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![format!("{}@{}", relative_path, commit_id)])
        }
    }

    fn service(root: Option<&str>) -> (ContentService, Arc<FakeRepo>) {
        let repo = Arc::new(FakeRepo {
            root: root.map(PathBuf::from),
            reads: AtomicUsize::new(0),
        });
        let backend: Arc<dyn VcsBackend> = repo.clone();
        let resolver = RevisionResolver::new(Arc::clone(&backend));
        let cache = ContentCache::new(Arc::clone(&backend), NonZeroUsize::new(8).unwrap());
        (ContentService::new(backend, resolver, cache), repo)
    }

    #[tokio::test]
    async fn test_file_at_revision() {
        let (service, _) = service(Some("/work/repo"));
        let file = service
            .file_at_revision("HEAD", Path::new("/work/repo/src/lib.rs"))
            .await
            .unwrap();
        assert_eq!(file.revision, "HEAD");
        assert_eq!(file.commit_id.as_str(), "c0ffee");
        assert_eq!(file.repo_root, PathBuf::from("/work/repo"));
        assert_eq!(file.relative_path, "src/lib.rs");
        assert_eq!(file.lines, vec!["src/lib.rs@c0ffee"]);
    }

    #[tokio::test]
    async fn test_relative_path_starts_at_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        let (service, _) = service(cwd.to_str());
        let file = service
            .file_at_revision("HEAD", Path::new("no-such-dir/x.rs"))
            .await
            .unwrap();
        assert_eq!(file.repo_root, cwd);
        assert_eq!(file.relative_path, "no-such-dir/x.rs");
        assert_eq!(file.lines, vec!["no-such-dir/x.rs@c0ffee"]);
    }

    #[tokio::test]
    async fn test_aliases_share_cache_entry() {
        let (service, repo) = service(Some("/work/repo"));
        let path = Path::new("/work/repo/a.txt");
        service.file_at_revision("HEAD", path).await.unwrap();
        service.file_at_revision("main", path).await.unwrap();
        assert_eq!(repo.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_a_repository() {
        let (service, _) = service(None);
        let err = service
            .file_at_revision("HEAD", Path::new("/tmp/loose.txt"))
            .await
            .unwrap_err();
        assert_eq!(err, VcsError::NotARepository("/tmp/loose.txt".into()));
    }

    #[tokio::test]
    async fn test_unknown_revision_skips_read() {
        let (service, repo) = service(Some("/work/repo"));
        let err = service
            .file_at_revision("invalid-revision-12345", Path::new("/work/repo/a.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::RevisionResolution { .. }));
        assert!(err.diagnostic().unwrap_or_default().contains("invalid-revision-12345"));
        assert_eq!(repo.reads.load(Ordering::SeqCst), 0);
    }
}
