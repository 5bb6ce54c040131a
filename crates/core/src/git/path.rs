//! Host-independent repository-relative paths.
//!
//! Cache keys and `git cat-file -p <commit>:<path>` both need a forward-slash
//! path relative to the repository root, whatever separator the host uses.

use std::path::{Path, PathBuf};

/// Convert `path` to a forward-slash path relative to `repo_root`.
///
/// Rules:
/// 1. Backslashes in both inputs become forward slashes.
/// 2. If `path` lies under `repo_root` (on a component boundary), the root
///    prefix and the following slash are stripped.
/// 3. Otherwise the path is returned as-is apart from rule 1, minus any
///    leading `./`.
///
/// `/home/user/project` + `/home/user/project/src/my file.lua` gives
/// `src/my file.lua`.
pub fn normalize_relative(repo_root: &str, path: &str) -> String {
    let root = repo_root.replace('\\', "/");
    let root = root.trim_end_matches('/');
    let path = path.replace('\\', "/");

    if !root.is_empty() {
        if let Some(rest) = path.strip_prefix(root) {
            if rest.is_empty() {
                return String::new();
            }
            if let Some(relative) = rest.strip_prefix('/') {
                return relative.trim_start_matches('/').to_string();
            }
        }
    }

    path.trim_start_matches("./").to_string()
}

/// [`normalize_relative`] for native paths.
pub fn normalize_path(repo_root: &Path, path: &Path) -> String {
    normalize_relative(&repo_root.to_string_lossy(), &path.to_string_lossy())
}

/// `path` anchored at `cwd` when relative. Symlinks are resolved when the
/// file exists so the result shares a prefix with the work tree git reports;
/// otherwise `.` segments are dropped.
pub fn absolute_path(path: &Path, cwd: &Path) -> PathBuf {
    let joined = cwd.join(path);
    match joined.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) => joined.components().collect(),
    }
}

/// [`absolute_path`] against the process's current directory.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(absolute_path(path, Path::new("/")));
    }
    Ok(absolute_path(path, &std::env::current_dir()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_unix_root() {
        assert_eq!(
            normalize_relative("/home/user/project", "/home/user/project/src/my file.lua"),
            "src/my file.lua"
        );
    }

    #[test]
    fn test_windows_separators() {
        assert_eq!(
            normalize_relative(
                "C:\\Users\\dev\\project",
                "C:\\Users\\dev\\project\\src\\my file.lua"
            ),
            "src/my file.lua"
        );
        assert_eq!(
            normalize_relative("C:/Users/dev/project", "C:\\Users\\dev\\project\\lua\\init.lua"),
            "lua/init.lua"
        );
    }

    #[test]
    fn test_trailing_slash_on_root() {
        assert_eq!(
            normalize_relative("/home/user/project/", "/home/user/project/a.txt"),
            "a.txt"
        );
    }

    #[test]
    fn test_sibling_directory_is_not_stripped() {
        assert_eq!(
            normalize_relative("/home/user/project", "/home/user/projectx/a.txt"),
            "/home/user/projectx/a.txt"
        );
    }

    #[test]
    fn test_already_relative() {
        assert_eq!(normalize_relative("/repo", "src\\main.rs"), "src/main.rs");
        assert_eq!(normalize_relative("/repo", "./src/main.rs"), "src/main.rs");
    }

    #[test]
    fn test_native_paths() {
        assert_eq!(
            normalize_path(Path::new("/repo"), Path::new("/repo/dir/file.rs")),
            "dir/file.rs"
        );
    }

    #[test]
    fn test_absolute_path_anchors_relative_paths() {
        let cwd = Path::new("/no/such/repo/sub");
        assert_eq!(
            absolute_path(Path::new("x.rs"), cwd),
            PathBuf::from("/no/such/repo/sub/x.rs")
        );
        assert_eq!(
            absolute_path(Path::new("./deeper/./y.rs"), cwd),
            PathBuf::from("/no/such/repo/sub/deeper/y.rs")
        );
        assert_eq!(
            absolute_path(Path::new("/elsewhere/z.rs"), cwd),
            PathBuf::from("/elsewhere/z.rs")
        );
    }

    #[test]
    fn test_absolute_path_then_normalize() {
        let root = Path::new("/no/such/repo");
        let file = absolute_path(Path::new("sub/x.rs"), root);
        assert_eq!(normalize_path(root, &file), "sub/x.rs");
    }

    #[test]
    fn test_absolute_canonicalizes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        assert_eq!(
            absolute_path(Path::new("a.txt"), dir.path()),
            dir.path().join("a.txt").canonicalize().unwrap()
        );
    }
}
