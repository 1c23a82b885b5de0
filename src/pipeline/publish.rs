//! Deploy orchestration
//!
//! Ties the pipeline together and owns the two hard guarantees:
//!
//! - **Idempotent**: an unchanged build produces no commit and no push.
//! - **Atomic**: the remote branch either advances by one commit with the
//!   complete new tree, or stays where it was. A failed push resets the
//!   local cache branch to its pre-deploy commit.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DeployConfig;
use crate::git::{self, PushOutcome};
use crate::journal::{DeployRecord, Journal};
use crate::paths;

use super::diff::{self, ChangeSet};
use super::scan::{self, Snapshot};
use super::stage;

/// Runtime switches for a deploy
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Compute and report the change set, touch nothing
    pub dry_run: bool,
    /// Commit locally but skip the push
    pub no_push: bool,
    /// Allow publishing an empty build directory
    pub force: bool,
}

/// What a deploy did
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub url: String,
    pub branch: String,
    /// New commit on the hosting branch, None when nothing changed or on
    /// a dry run
    pub commit: Option<String>,
    /// Branch tip before the deploy, None when the branch was created
    pub previous: Option<String>,
    pub changes: ChangeSet,
    pub pushed: bool,
    pub branch_created: bool,
}

/// What a rollback did
#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    pub url: String,
    pub branch: String,
    pub from: String,
    pub to: String,
}

/// A prepared cache entry for one remote
#[derive(Debug, Clone)]
pub struct Target {
    pub url: String,
    pub clone_dir: PathBuf,
    pub journal_path: PathBuf,
}

/// Repository URL for this deploy: explicit `repo` config, otherwise the
/// named remote of the surrounding git repository.
pub fn resolve_url(config: &DeployConfig, root: &Path) -> Result<String> {
    match &config.repo {
        Some(url) => Ok(url.clone()),
        None => git::remote_url(root, &config.remote),
    }
}

/// Clone the remote into the cache (or fetch an existing cache clone).
pub fn prepare(url: &str, cache_root: &Path) -> Result<Target> {
    let key = git::cache_key(url);
    let clone_dir = paths::clone_dir(cache_root, &key);
    let journal_path = paths::journal_path(cache_root, &key);

    if git::is_repo(&clone_dir) {
        git::fetch(&clone_dir, "origin")?;
    } else {
        if clone_dir.exists() {
            // Half-written clone from an interrupted run
            fs::remove_dir_all(&clone_dir)
                .with_context(|| format!("Failed to clear {}", clone_dir.display()))?;
        }
        fs::create_dir_all(
            clone_dir
                .parent()
                .context("Cache clone has no parent directory")?,
        )?;
        git::clone(url, &clone_dir)?;
    }

    Ok(Target {
        url: url.to_string(),
        clone_dir,
        journal_path,
    })
}

/// Check out the hosting branch in the cache clone.
///
/// Returns the branch tip as fetched from the remote, or None when the
/// branch does not exist there yet (first deploy: an orphan branch is
/// created). The local branch is always reset to the remote tip, so a
/// leftover commit from an earlier failed push is discarded and rebuilt.
fn sync_branch(target: &Target, branch: &str) -> Result<Option<String>> {
    let dir = &target.clone_dir;

    if git::remote_branch_exists(dir, "origin", branch)? {
        git::checkout_branch(dir, branch, "origin")?;
        let tip = git::rev_parse(dir, &format!("refs/remotes/origin/{}", branch))?;
        Ok(Some(tip))
    } else {
        if git::local_branch_exists(dir, branch)? {
            git::delete_branch(dir, branch)?;
        }
        git::checkout_orphan(dir, branch)?;
        Ok(None)
    }
}

/// Snapshot the build directory and fold in generated extras.
fn snapshot_build(config: &DeployConfig, root: &Path) -> Result<Snapshot> {
    let mut snapshot = scan_build(config, root)?;
    add_extras(config, &mut snapshot);
    Ok(snapshot)
}

/// Snapshot the build directory only, before any generated extras.
///
/// The empty-build guard must run against this, not the full snapshot: a
/// configured CNAME or .nojekyll would otherwise mask an empty build and
/// let a deploy wipe the whole site.
fn scan_build(config: &DeployConfig, root: &Path) -> Result<Snapshot> {
    let build_dir = config.build_dir(root);
    scan::scan(&build_dir, config.dotfiles, &config.src)
}

fn add_extras(config: &DeployConfig, snapshot: &mut Snapshot) {
    if let Some(domain) = &config.cname {
        snapshot.add_inline("CNAME", format!("{}\n", domain.trim()).into_bytes());
    }
    if config.nojekyll {
        snapshot.add_inline(".nojekyll", Vec::new());
    }
}

/// Scan, sync and diff without touching anything. Backs `status` and
/// `deploy --dry-run`.
pub fn preview(
    config: &DeployConfig,
    root: &Path,
    cache_root: &Path,
) -> Result<(ChangeSet, Target, Option<String>)> {
    let snapshot = snapshot_build(config, root)?;
    let url = resolve_url(config, root)?;
    let target = prepare(&url, cache_root)?;
    let remote_tip = sync_branch(&target, &config.branch)?;

    let deployed = scan::deployed_state(&target.clone_dir)?;
    let changes = diff::compute(&snapshot, &deployed, &config.keep)?;

    Ok((changes, target, remote_tip))
}

/// Run the full pipeline.
pub fn deploy(
    config: &DeployConfig,
    root: &Path,
    cache_root: &Path,
    opts: &PublishOptions,
) -> Result<DeployOutcome> {
    let mut snapshot = scan_build(config, root)?;
    if snapshot.is_empty() && !opts.force {
        anyhow::bail!(
            "Build directory is empty: {}\n\
             \n\
             Publishing an empty site would wipe the hosting branch.\n\
             Pass --force if that is really what you want.",
            config.build_dir(root).display()
        );
    }
    add_extras(config, &mut snapshot);

    let url = resolve_url(config, root)?;
    let target = prepare(&url, cache_root)?;
    ensure_commit_identity(config, &target.clone_dir)?;

    let mut remote_tip = sync_branch(&target, &config.branch)?;
    let branch_created = remote_tip.is_none();

    let deployed = scan::deployed_state(&target.clone_dir)?;
    let mut changes = diff::compute(&snapshot, &deployed, &config.keep)?;

    let mut outcome = DeployOutcome {
        url: target.url.clone(),
        branch: config.branch.clone(),
        commit: None,
        previous: remote_tip.clone(),
        changes: changes.clone(),
        pushed: false,
        branch_created,
    };

    // Idempotency short-circuit: local branch equals the remote tip and
    // the build matches it exactly.
    if changes.is_empty() || opts.dry_run {
        return Ok(outcome);
    }

    let mut new_commit = commit_changes(&target, &snapshot, &changes, &config.message)?;

    if opts.no_push {
        let mut journal = Journal::load(&target.journal_path)?;
        journal.append(record_for(&changes, &new_commit, &remote_tip, config, false))?;
        outcome.commit = Some(new_commit);
        outcome.changes = changes;
        return Ok(outcome);
    }

    let mut push = git::push_with_retry(
        &target.clone_dir,
        "origin",
        &config.branch,
        remote_tip.as_deref(),
        config.push_retries,
        config.retry_delay_ms,
    )?;

    if push == PushOutcome::LeaseRejected {
        // Someone else moved the branch between our fetch and push.
        // Re-fetch, rebuild the diff against the new tip, and try once
        // more with the updated lease.
        println!("⚠️  Remote branch moved during deploy, re-syncing...");
        git::fetch(&target.clone_dir, "origin")?;
        remote_tip = sync_branch(&target, &config.branch)?;

        let deployed = scan::deployed_state(&target.clone_dir)?;
        changes = diff::compute(&snapshot, &deployed, &config.keep)?;
        outcome.previous = remote_tip.clone();

        if changes.is_empty() {
            // The concurrent deploy published the same content
            outcome.changes = changes;
            return Ok(outcome);
        }

        new_commit = commit_changes(&target, &snapshot, &changes, &config.message)?;
        push = git::push_with_retry(
            &target.clone_dir,
            "origin",
            &config.branch,
            remote_tip.as_deref(),
            config.push_retries,
            config.retry_delay_ms,
        )?;
    }

    match push {
        PushOutcome::Pushed => {
            let mut journal = Journal::load(&target.journal_path)?;
            journal.append(record_for(&changes, &new_commit, &remote_tip, config, true))?;
            outcome.commit = Some(new_commit);
            outcome.changes = changes;
            outcome.pushed = true;
            Ok(outcome)
        }
        other => {
            // Roll the local branch back so the next run starts from the
            // remote's state, not our orphaned commit.
            if let Some(tip) = &remote_tip {
                git::reset_hard(&target.clone_dir, tip)?;
            }
            match other {
                PushOutcome::Failed(err) => anyhow::bail!(
                    "Push to {} failed after {} attempts: {}\n\
                     \n\
                     The remote branch was not modified. Fix the connection\n\
                     or authentication issue and re-run the deploy.",
                    target.url,
                    config.push_retries,
                    err
                ),
                _ => anyhow::bail!(
                    "Remote branch '{}' keeps moving; deploy aborted.\n\
                     The remote branch was not modified by this run.",
                    config.branch
                ),
            }
        }
    }
}

/// Reset the hosting branch to an earlier deployed commit and push.
pub fn rollback(
    config: &DeployConfig,
    root: &Path,
    cache_root: &Path,
    to: Option<&str>,
) -> Result<RollbackOutcome> {
    let url = resolve_url(config, root)?;
    let target = prepare(&url, cache_root)?;

    let current_tip = sync_branch(&target, &config.branch)?.with_context(|| {
        format!(
            "Branch '{}' does not exist on {}; nothing to roll back",
            config.branch, url
        )
    })?;

    let journal = Journal::load(&target.journal_path)?;
    let to_sha = match to {
        Some(rev) => git::rev_parse(&target.clone_dir, rev)?,
        None => journal
            .rollback_target(&current_tip)
            .context(
                "No earlier deploy found in the journal for the current branch tip.\n\
                 \n\
                 Either the branch was last deployed from another machine, or\n\
                 this is the first deploy. Pass an explicit commit: --to <sha>",
            )?
            .to_string(),
    };

    if to_sha == current_tip {
        anyhow::bail!("Branch '{}' is already at {}", config.branch, &to_sha[..12]);
    }

    git::reset_hard(&target.clone_dir, &to_sha)?;

    match git::push_with_retry(
        &target.clone_dir,
        "origin",
        &config.branch,
        Some(&current_tip),
        config.push_retries,
        config.retry_delay_ms,
    )? {
        PushOutcome::Pushed => {}
        PushOutcome::LeaseRejected => {
            git::reset_hard(&target.clone_dir, &current_tip)?;
            anyhow::bail!(
                "Remote branch '{}' moved since the last fetch; rollback aborted.\n\
                 Re-run to retry against the new tip.",
                config.branch
            );
        }
        PushOutcome::Failed(err) => {
            git::reset_hard(&target.clone_dir, &current_tip)?;
            anyhow::bail!("Rollback push failed: {}", err);
        }
    }

    let mut journal = journal;
    journal.append(DeployRecord {
        timestamp: chrono::Utc::now(),
        commit: to_sha.clone(),
        previous: Some(current_tip.clone()),
        message: format!("Rollback to {}", &to_sha[..12]),
        added: 0,
        updated: 0,
        removed: 0,
        pushed: true,
    })?;

    Ok(RollbackOutcome {
        url: target.url,
        branch: config.branch.clone(),
        from: current_tip,
        to: to_sha,
    })
}

fn commit_changes(
    target: &Target,
    snapshot: &Snapshot,
    changes: &ChangeSet,
    message: &str,
) -> Result<String> {
    stage::apply(snapshot, changes, &target.clone_dir)?;
    git::add_all(&target.clone_dir)?;

    if !git::has_staged_changes(&target.clone_dir)? {
        // The diff said otherwise; treat as an internal bug rather than
        // silently pushing nothing.
        anyhow::bail!("Staging produced no changes despite a non-empty change set");
    }

    git::commit(&target.clone_dir, message)?;
    git::head_sha(&target.clone_dir)?.context("Commit succeeded but HEAD is unborn")
}

/// Make sure deploy commits have an identity: config wins, then whatever
/// git already resolves, then a neutral fallback.
fn ensure_commit_identity(config: &DeployConfig, clone_dir: &Path) -> Result<()> {
    if let Some(user) = &config.user {
        git::config_set(clone_dir, "user.name", &user.name)?;
        git::config_set(clone_dir, "user.email", &user.email)?;
        return Ok(());
    }

    if git::config_get(clone_dir, "user.email")?.is_none() {
        git::config_set(clone_dir, "user.name", "pagepress")?;
        git::config_set(clone_dir, "user.email", "pagepress@localhost")?;
    }

    Ok(())
}

fn record_for(
    changes: &ChangeSet,
    commit: &str,
    previous: &Option<String>,
    config: &DeployConfig,
    pushed: bool,
) -> DeployRecord {
    DeployRecord {
        timestamp: chrono::Utc::now(),
        commit: commit.to_string(),
        previous: previous.clone(),
        message: config.message.clone(),
        added: changes.added.len(),
        updated: changes.updated.len(),
        removed: changes.removed.len(),
        pushed,
    }
}
