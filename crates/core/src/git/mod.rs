//! Version-control access: backend trait, `git` client, revision
//! resolution, and the revision content cache.

pub mod backend;
pub mod cache;
pub mod client;
pub mod content;
pub mod path;
pub mod resolver;

pub use backend::VcsBackend;
pub use cache::{CacheKey, ContentCache};
pub use client::GitCli;
pub use content::{ContentService, RevisionFile};
pub use path::{absolute, absolute_path, normalize_path, normalize_relative};
pub use resolver::{CommitId, RevisionResolver};
