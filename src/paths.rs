//! Single source of truth for pagepress filesystem layout.
//!
//! This module defines WHERE data lives. It has no I/O, no validation,
//! no business logic.
//!
//! # User-Level Paths (~/.pagepress/)
//!
//! ```text
//! ~/.pagepress/
//! └── cache/                   # Derived (rebuildable)
//!     └── repos/               # Per-remote cache entries
//!         └── <url-digest>/    # One entry per remote URL
//!             ├── repo/        # The cache clone
//!             └── journal.json # Deploy journal for this remote
//! ```
//!
//! # Project-Level Paths
//!
//! ```text
//! project/
//! └── pagepress.toml           # Deploy config (optional, defaults apply)
//! ```

use std::path::{Path, PathBuf};

/// User's pagepress home directory: `~/.pagepress/`
pub fn pagepress_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pagepress")
}

/// Cache directory for all rebuildable data: `~/.pagepress/cache/`
pub fn pagepress_cache() -> PathBuf {
    pagepress_home().join("cache")
}

/// Cache clones of target repositories: `~/.pagepress/cache/repos/`
pub fn repos_cache_dir() -> PathBuf {
    pagepress_cache().join("repos")
}

/// Cache entry for one remote, under a caller-chosen cache root.
///
/// `key` is the digest of the normalized remote URL (see
/// [`crate::git::remote::cache_key`]).
pub fn repo_cache_dir(cache_root: &Path, key: &str) -> PathBuf {
    cache_root.join(key)
}

/// The cache clone itself. Kept one level below the cache entry so the
/// journal never sits inside the clone's worktree.
pub fn clone_dir(cache_root: &Path, key: &str) -> PathBuf {
    repo_cache_dir(cache_root, key).join("repo")
}

/// Deploy journal for one remote, stored alongside its cache clone.
pub fn journal_path(cache_root: &Path, key: &str) -> PathBuf {
    repo_cache_dir(cache_root, key).join("journal.json")
}

/// Project config file: `{root}/pagepress.toml`
pub fn config_path(root: &Path) -> PathBuf {
    root.join("pagepress.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagepress_home() {
        let home = pagepress_home();
        assert!(home.ends_with(".pagepress"));
    }

    #[test]
    fn test_pagepress_cache() {
        let cache = pagepress_cache();
        assert!(cache.ends_with("cache"));
        assert!(cache.starts_with(pagepress_home()));
    }

    #[test]
    fn test_repo_cache_layout() {
        let root = Path::new("/tmp/cache/repos");
        let entry = repo_cache_dir(root, "ab12cd34");
        assert_eq!(entry, PathBuf::from("/tmp/cache/repos/ab12cd34"));

        let clone = clone_dir(root, "ab12cd34");
        assert!(clone.ends_with("ab12cd34/repo"));

        let journal = journal_path(root, "ab12cd34");
        assert!(journal.ends_with("ab12cd34/journal.json"));
        assert!(!journal.starts_with(&clone));
    }

    #[test]
    fn test_config_path() {
        let root = Path::new("/home/user/site");
        assert_eq!(
            config_path(root),
            PathBuf::from("/home/user/site/pagepress.toml")
        );
    }
}
