//! Revision content cache.
//!
//! Maps `(commit id, repository-relative path)` to the file's lines. At most
//! one backend read runs per key at a time: later callers for the same key
//! wait on the in-flight read instead of spawning another process. Each read
//! runs in its own task, so a caller that stops waiting does not cancel it
//! for the others. Successful reads are kept under an LRU bound; failures
//! are handed to every waiter and never stored.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info};

use super::backend::VcsBackend;
use super::path::normalize_relative;
use crate::errors::VcsError;

type FetchResult = Result<Vec<String>, VcsError>;

/// Key of a cached file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub revision: String,
    /// Forward-slash path relative to the repository root.
    pub path: String,
}

impl CacheKey {
    pub fn new(revision: &str, repo_root: &Path, path: &str) -> Self {
        Self {
            revision: revision.to_string(),
            path: normalize_relative(&repo_root.to_string_lossy(), path),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.revision, self.path)
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Arc<[String]>>,
    /// Least recently used at the front.
    order: VecDeque<CacheKey>,
    /// Waiters of in-flight reads, in attach order.
    pending: HashMap<CacheKey, Vec<oneshot::Sender<FetchResult>>>,
}

impl CacheState {
    fn touch(&mut self, key: &CacheKey) -> Option<Arc<[String]>> {
        let entry = self.entries.get(key)?.clone();
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
        Some(entry)
    }

    fn insert(&mut self, key: CacheKey, entry: Arc<[String]>, capacity: usize) {
        if self.entries.insert(key.clone(), entry).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);
        while self.entries.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            debug!(key = %oldest, "evicted cached content");
        }
    }
}

struct CacheInner {
    backend: Arc<dyn VcsBackend>,
    capacity: NonZeroUsize,
    state: Mutex<CacheState>,
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a successful result and hand copies to every waiter.
    fn complete(&self, key: &CacheKey, result: FetchResult) {
        let mut state = self.lock();
        let waiters = state.pending.remove(key).unwrap_or_default();
        match result {
            Ok(lines) => {
                let entry: Arc<[String]> = lines.into();
                state.insert(key.clone(), Arc::clone(&entry), self.capacity.get());
                debug!(%key, waiters = waiters.len(), "cached content");
                for waiter in waiters {
                    // A waiter that went away simply misses the result.
                    let _ = waiter.send(Ok(entry.to_vec()));
                }
            }
            Err(e) => {
                debug!(%key, waiters = waiters.len(), error = %e, "content read failed");
                for waiter in waiters {
                    let _ = waiter.send(Err(e.clone()));
                }
            }
        }
    }
}

/// Releases waiters if the read task dies before completing.
struct FetchGuard {
    inner: Arc<CacheInner>,
    key: CacheKey,
    done: bool,
}

impl FetchGuard {
    fn finish(mut self, result: FetchResult) {
        self.done = true;
        self.inner.complete(&self.key, result);
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        if !self.done {
            self.inner
                .complete(&self.key, Err(VcsError::FetchAborted(self.key.to_string())));
        }
    }
}

/// Shared, deduplicating, LRU-bounded cache of file content by revision.
///
/// Cloning is cheap and every clone shares the same entries.
#[derive(Clone)]
pub struct ContentCache {
    inner: Arc<CacheInner>,
}

impl ContentCache {
    pub fn new(backend: Arc<dyn VcsBackend>, capacity: NonZeroUsize) -> Self {
        info!(capacity = capacity.get(), "created content cache");
        Self {
            inner: Arc::new(CacheInner {
                backend,
                capacity,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `path` at `revision` is stored. Does not affect LRU order.
    pub fn contains(&self, revision: &str, repo_root: &Path, path: &str) -> bool {
        let key = CacheKey::new(revision, repo_root, path);
        self.inner.lock().entries.contains_key(&key)
    }

    /// Number of keys with a read in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.order.clear();
    }

    /// Lines of `relative_path` at `revision_id`.
    ///
    /// `relative_path` may also be an absolute path under `repo_root`; it is
    /// normalized before it becomes part of the key. The returned vector is
    /// always a fresh copy.
    pub async fn get(
        &self,
        revision_id: &str,
        repo_root: &Path,
        relative_path: &str,
    ) -> Result<Vec<String>, VcsError> {
        let key = CacheKey::new(revision_id, repo_root, relative_path);

        let receiver = {
            let mut state = self.inner.lock();
            if let Some(entry) = state.touch(&key) {
                debug!(%key, "content cache hit");
                return Ok(entry.to_vec());
            }

            let (sender, receiver) = oneshot::channel();
            match state.pending.get_mut(&key) {
                Some(waiters) => {
                    waiters.push(sender);
                    debug!(%key, waiters = waiters.len(), "joined in-flight read");
                }
                None => {
                    state.pending.insert(key.clone(), vec![sender]);
                    self.spawn_read(key.clone(), repo_root.to_path_buf());
                }
            }
            receiver
        };

        receiver
            .await
            .map_err(|_| VcsError::FetchAborted(key.to_string()))?
    }

    fn spawn_read(&self, key: CacheKey, repo_root: PathBuf) {
        debug!(%key, "content cache miss, reading from backend");
        let guard = FetchGuard {
            inner: Arc::clone(&self.inner),
            key,
            done: false,
        };
        tokio::spawn(async move {
            let backend = Arc::clone(&guard.inner.backend);
            let result = backend
                .read(&guard.key.revision, &repo_root, &guard.key.path)
                .await;
            guard.finish(result);
        });
    }
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
