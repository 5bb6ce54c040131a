//! Asynchronous Git CLI backend.
//!
//! Revision resolution and file reads spawn `git` through
//! `tokio::process`; repository root discovery goes through `git2` on the
//! blocking pool.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use git2::Repository;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::backend::VcsBackend;
use super::path::absolute;
use crate::errors::VcsError;

/// [`VcsBackend`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    /// Create a backend that runs `binary` (usually `git`).
    pub fn new(binary: impl Into<String>) -> Self {
        let client = Self {
            binary: binary.into(),
        };
        debug!(binary = %client.binary, "created GitCli");
        client
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    async fn run_git(&self, repo_root: &Path, args: &[&str]) -> Result<Output, VcsError> {
        let root = repo_root.to_string_lossy();
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-C")
            .arg(repo_root)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            cmd = ?format!("{} -C {} {}", self.binary, root, args.join(" ")),
            "running git command"
        );
        cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VcsError::BinaryNotFound(self.binary.clone())
            } else {
                VcsError::Spawn {
                    program: self.binary.clone(),
                    detail: e.to_string(),
                }
            }
        })
    }
}

/// Stderr of a failed command, or a description of the exit status when
/// the process printed nothing.
fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    match output.status.code() {
        Some(code) => format!("git exited with status {}", code),
        None => "git was terminated by a signal".to_string(),
    }
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Walk up from `path` (or its nearest existing ancestor) to a work tree.
/// Relative paths start from the current directory.
fn discover_root(path: &Path) -> Option<PathBuf> {
    let path = absolute(path).ok()?;
    let start = path.ancestors().find(|p| p.is_dir())?;
    let repo = Repository::discover(start).ok()?;
    // Normalizing through components drops the trailing slash git2 adds.
    let workdir = repo.workdir()?;
    Some(workdir.components().collect())
}

#[async_trait]
impl VcsBackend for GitCli {
    #[instrument(skip(self, path), fields(path = %path.display()))]
    async fn root_of(&self, path: &Path) -> Result<Option<PathBuf>, VcsError> {
        let owned = path.to_path_buf();
        let root = tokio::task::spawn_blocking(move || discover_root(&owned))
            .await
            .map_err(|e| VcsError::Spawn {
                program: "git2".into(),
                detail: e.to_string(),
            })?;
        debug!(root = ?root, "repository root lookup");
        Ok(root)
    }

    #[instrument(skip(self, repo_root), fields(root = %repo_root.display()))]
    async fn resolve(&self, revision: &str, repo_root: &Path) -> Result<String, VcsError> {
        if revision.is_empty() || revision.starts_with('-') {
            return Err(VcsError::RevisionResolution {
                revision: revision.to_string(),
                diagnostic: "revision names must be non-empty and must not start with '-'".into(),
            });
        }

        let rev_expr = format!("{}^{{commit}}", revision);
        let output = self
            .run_git(repo_root, &["rev-parse", "--verify", &rev_expr])
            .await?;
        if !output.status.success() {
            let diagnostic = diagnostic(&output);
            warn!(revision, %diagnostic, "git rev-parse failed");
            return Err(VcsError::RevisionResolution {
                revision: revision.to_string(),
                diagnostic,
            });
        }

        let commit_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(revision, %commit_id, "resolved revision");
        Ok(commit_id)
    }

    #[instrument(skip(self, repo_root), fields(root = %repo_root.display()))]
    async fn read(
        &self,
        commit_id: &str,
        repo_root: &Path,
        relative_path: &str,
    ) -> Result<Vec<String>, VcsError> {
        let object = format!("{}:{}", commit_id, relative_path);
        let output = self.run_git(repo_root, &["cat-file", "-p", &object]).await?;
        if !output.status.success() {
            let diagnostic = diagnostic(&output);
            warn!(commit_id, relative_path, %diagnostic, "git cat-file failed");
            return Err(VcsError::ContentRead {
                revision: commit_id.to_string(),
                path: relative_path.to_string(),
                diagnostic,
            });
        }

        let lines = stdout_lines(&output);
        debug!(commit_id, relative_path, lines = lines.len(), "read file at revision");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        assert_eq!(GitCli::default().binary(), "git");
        assert_eq!(GitCli::new("/usr/local/bin/git").binary(), "/usr/local/bin/git");
    }

    #[tokio::test]
    async fn test_rejects_option_like_revision() {
        let client = GitCli::default();
        let err = client
            .resolve("--output=/tmp/x", Path::new("/"))
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::RevisionResolution { .. }));
        assert!(!err.diagnostic().unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let client = GitCli::new("definitely-not-a-git-binary-12345");
        let err = client
            .resolve("HEAD", Path::new("/"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            VcsError::BinaryNotFound("definitely-not-a-git-binary-12345".into())
        );
    }

    #[tokio::test]
    async fn test_root_of_missing_file_in_repository() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let root = GitCli::default()
            .root_of(&dir.path().join("sub").join("missing.rs"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_root_of_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitCli::default();
        // A fresh temp dir is not under a repository unless $TMPDIR itself is.
        if Repository::discover(dir.path()).is_err() {
            assert_eq!(client.root_of(dir.path()).await.unwrap(), None);
        }
    }
}
