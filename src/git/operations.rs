//! Low-level git operations
//!
//! Every function takes the repository directory explicitly and runs
//! `git -C <dir> ...`. The deploy pipeline never touches the user's own
//! worktree; all of these run inside the cache clone, except
//! [`remote_url`] which resolves the project's remote.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Result of a guarded push attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// Remote ref updated
    Pushed,
    /// The lease failed: the remote tip moved since our last fetch
    LeaseRejected,
    /// Any other failure (network, auth, missing remote)
    Failed(String),
}

fn git(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(dir);
    cmd
}

/// Check whether a directory is the top of a git repository
pub fn is_repo(dir: &Path) -> bool {
    dir.join(".git").is_dir()
}

/// Clone a repository into `dest`
pub fn clone(url: &str, dest: &Path) -> Result<()> {
    let output = Command::new("git")
        .args(["clone", "--origin", "origin", url])
        .arg(dest)
        .output()
        .context("Failed to run git clone")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to clone {}: {}",
            url,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Fetch a remote, pruning deleted branches
pub fn fetch(dir: &Path, remote: &str) -> Result<()> {
    let output = git(dir)
        .args(["fetch", "--prune", remote])
        .output()
        .context("Failed to run git fetch")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to fetch {}: {}",
            remote,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Check if a branch exists on the fetched remote
pub fn remote_branch_exists(dir: &Path, remote: &str, branch: &str) -> Result<bool> {
    let output = git(dir)
        .args([
            "rev-parse",
            "--verify",
            &format!("refs/remotes/{}/{}", remote, branch),
        ])
        .output()
        .context("Failed to check remote branch")?;

    Ok(output.status.success())
}

/// Check if a local branch exists
pub fn local_branch_exists(dir: &Path, branch: &str) -> Result<bool> {
    let output = git(dir)
        .args(["rev-parse", "--verify", &format!("refs/heads/{}", branch)])
        .output()
        .context("Failed to check local branch")?;

    Ok(output.status.success())
}

/// Check out a branch, resetting it to the remote tracking ref
pub fn checkout_branch(dir: &Path, branch: &str, remote: &str) -> Result<()> {
    let output = git(dir)
        .args([
            "checkout",
            "-B",
            branch,
            &format!("refs/remotes/{}/{}", remote, branch),
        ])
        .output()
        .context("Failed to checkout branch")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to checkout {}: {}",
            branch,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Create an orphan branch with an empty worktree and index.
///
/// Used for the first deploy, when the hosting branch does not exist on
/// the remote yet.
pub fn checkout_orphan(dir: &Path, branch: &str) -> Result<()> {
    let output = git(dir)
        .args(["checkout", "--orphan", branch])
        .output()
        .context("Failed to create orphan branch")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to create orphan branch {}: {}",
            branch,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    // Orphan checkout keeps the previous tree staged; drop it so the
    // branch starts empty.
    let output = git(dir)
        .args(["rm", "-rf", "--quiet", "--ignore-unmatch", "."])
        .output()
        .context("Failed to clear orphan worktree")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to clear orphan worktree: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    // Untracked leftovers (e.g. the journal lives outside the worktree,
    // but build files from an aborted run may not)
    let output = git(dir)
        .args(["clean", "-fdq"])
        .output()
        .context("Failed to clean orphan worktree")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to clean orphan worktree: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Delete a local branch (used to rebuild an orphan branch after a
/// failed first deploy)
pub fn delete_branch(dir: &Path, branch: &str) -> Result<()> {
    let output = git(dir)
        .args(["branch", "-D", branch])
        .output()
        .context("Failed to delete branch")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to delete branch {}: {}",
            branch,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Read a git config value, None when unset
pub fn config_get(dir: &Path, key: &str) -> Result<Option<String>> {
    let output = git(dir)
        .args(["config", "--get", key])
        .output()
        .context("Failed to read git config")?;

    if output.status.success() {
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if value.is_empty() { None } else { Some(value) })
    } else {
        Ok(None)
    }
}

/// Set a repository-local git config value
pub fn config_set(dir: &Path, key: &str, value: &str) -> Result<()> {
    let output = git(dir)
        .args(["config", key, value])
        .output()
        .context("Failed to set git config")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to set git config {}: {}",
            key,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Stage all changes in the worktree
pub fn add_all(dir: &Path) -> Result<()> {
    let output = git(dir)
        .args(["add", "--all"])
        .output()
        .context("Failed to stage changes")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to stage changes: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Check whether anything is staged for commit
pub fn has_staged_changes(dir: &Path) -> Result<bool> {
    // On an unborn branch `diff --cached` has no HEAD to compare against;
    // fall back to the index listing.
    if head_sha(dir)?.is_none() {
        let output = git(dir)
            .args(["ls-files", "--cached"])
            .output()
            .context("Failed to list index")?;
        return Ok(!output.stdout.is_empty());
    }

    let output = git(dir)
        .args(["diff", "--cached", "--quiet"])
        .output()
        .context("Failed to check staged changes")?;

    Ok(!output.status.success())
}

/// Create a commit
pub fn commit(dir: &Path, message: &str) -> Result<()> {
    let output = git(dir)
        .args(["commit", "-m", message])
        .output()
        .context("Failed to create commit")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to create commit: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Current HEAD commit, or None on an unborn branch
pub fn head_sha(dir: &Path) -> Result<Option<String>> {
    let output = git(dir)
        .args(["rev-parse", "--verify", "HEAD"])
        .output()
        .context("Failed to resolve HEAD")?;

    if output.status.success() {
        Ok(Some(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    } else {
        Ok(None)
    }
}

/// Resolve a revision to a full commit sha
pub fn rev_parse(dir: &Path, rev: &str) -> Result<String> {
    let output = git(dir)
        .args(["rev-parse", "--verify", &format!("{}^{{commit}}", rev)])
        .output()
        .context("Failed to resolve revision")?;

    if !output.status.success() {
        anyhow::bail!(
            "Unknown revision '{}': {}",
            rev,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Hard-reset the current branch and worktree to a commit
pub fn reset_hard(dir: &Path, sha: &str) -> Result<()> {
    let output = git(dir)
        .args(["reset", "--hard", sha])
        .output()
        .context("Failed to reset branch")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to reset to {}: {}",
            sha,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Tip of a branch on the live remote, or None if the branch is absent.
///
/// Queries the remote directly, not the local tracking ref.
pub fn ls_remote_head(dir: &Path, remote: &str, branch: &str) -> Result<Option<String>> {
    let output = git(dir)
        .args(["ls-remote", "--heads", remote, branch])
        .output()
        .context("Failed to query remote")?;

    if !output.status.success() {
        anyhow::bail!(
            "Failed to reach remote {}: {}",
            remote,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .split_whitespace()
        .next()
        .map(|sha| sha.to_string()))
}

/// Push a branch, guarded by a lease on the expected remote tip.
///
/// `expected` is the remote tip observed at fetch time; None means the
/// branch is being created and the push must not overwrite anything.
pub fn push_guarded(
    dir: &Path,
    remote: &str,
    branch: &str,
    expected: Option<&str>,
) -> Result<PushOutcome> {
    let lease = match expected {
        Some(sha) => format!("--force-with-lease=refs/heads/{}:{}", branch, sha),
        // Creating the branch: an empty expectation makes the push fail
        // if someone else created it first.
        None => format!("--force-with-lease=refs/heads/{}:", branch),
    };

    let output = git(dir)
        .args(["push", &lease, remote, &format!("{0}:refs/heads/{0}", branch)])
        .output()
        .context("Failed to run git push")?;

    if output.status.success() {
        return Ok(PushOutcome::Pushed);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("stale info") || stderr.contains("[rejected]") {
        Ok(PushOutcome::LeaseRejected)
    } else {
        Ok(PushOutcome::Failed(stderr.trim().to_string()))
    }
}

/// URL of a remote, resolved from the project directory
pub fn remote_url(dir: &Path, remote: &str) -> Result<String> {
    let output = git(dir)
        .args(["remote", "get-url", remote])
        .output()
        .context("Failed to get remote URL")?;

    if !output.status.success() {
        anyhow::bail!(
            "Remote '{}' not found. Set 'repo' in pagepress.toml or pass --repo.",
            remote
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
