//! Remote URL handling and the guarded push loop

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::thread;
use std::time::Duration;

use super::operations::{push_guarded, PushOutcome};

/// Normalize a remote URL for cache-key purposes
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}

/// Cache-clone directory name for a remote URL.
///
/// Content-addressed so the same remote always reuses its clone and
/// unrelated remotes never collide.
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(normalize_url(url).as_bytes());
    hex::encode(&digest[..8])
}

/// Parse a GitHub-style URL into (owner, repo).
///
/// Handles both SSH and HTTPS formats:
/// `git@github.com:owner/repo.git` and `https://github.com/owner/repo.git`
pub fn parse_owner_repo(url: &str) -> Option<(String, String)> {
    let cleaned = url
        .trim()
        .strip_suffix(".git")
        .unwrap_or(url.trim())
        .replace("git@github.com:", "")
        .replace("https://github.com/", "");

    let mut parts = cleaned.rsplit('/');
    let repo = parts.next()?;
    let owner = parts.next()?;
    if owner.is_empty() || repo.is_empty() || owner.contains(':') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

/// Push with retry on transient failure.
///
/// Transient failures (network, auth hiccups) are retried with a fixed
/// delay. A lease rejection is not transient - the remote tip moved - so
/// it is returned to the caller immediately for a re-fetch and re-diff.
pub fn push_with_retry(
    dir: &Path,
    remote: &str,
    branch: &str,
    expected: Option<&str>,
    retries: u32,
    delay_ms: u64,
) -> Result<PushOutcome> {
    let mut last_error = String::new();

    for attempt in 1..=retries {
        match push_guarded(dir, remote, branch, expected)? {
            PushOutcome::Pushed => return Ok(PushOutcome::Pushed),
            PushOutcome::LeaseRejected => return Ok(PushOutcome::LeaseRejected),
            PushOutcome::Failed(err) => {
                last_error = err;
                if attempt < retries {
                    println!(
                        "⚠️  Push attempt {}/{} failed, retrying in {}ms...",
                        attempt, retries, delay_ms
                    );
                    thread::sleep(Duration::from_millis(delay_ms));
                }
            }
        }
    }

    Ok(PushOutcome::Failed(last_error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_repo_ssh() {
        let url = "git@github.com:glebgorokhov/skewed-borders.git";
        let (owner, repo) = parse_owner_repo(url).unwrap();
        assert_eq!(owner, "glebgorokhov");
        assert_eq!(repo, "skewed-borders");
    }

    #[test]
    fn test_parse_owner_repo_https() {
        let url = "https://github.com/glebgorokhov/skewed-borders.git";
        let (owner, repo) = parse_owner_repo(url).unwrap();
        assert_eq!(owner, "glebgorokhov");
        assert_eq!(repo, "skewed-borders");
    }

    #[test]
    fn test_parse_owner_repo_local_path() {
        // Local paths are valid remotes but have no owner/repo shape
        assert!(parse_owner_repo("/tmp/some/repo").is_some());
        assert!(parse_owner_repo("repo-only").is_none());
    }

    #[test]
    fn test_cache_key_stable_across_git_suffix() {
        let a = cache_key("git@github.com:owner/site.git");
        let b = cache_key("git@github.com:owner/site");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_cache_key_distinct_remotes() {
        assert_ne!(
            cache_key("git@github.com:owner/site.git"),
            cache_key("git@github.com:owner/other.git")
        );
    }
}
