//! Apply a change set to the cache clone's worktree

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::diff::ChangeSet;
use super::scan::{Snapshot, Source};

/// Copy added/updated files into the worktree and delete removed ones.
///
/// Only paths named in the change set are touched; unchanged and kept
/// files stay as they are on the branch.
pub fn apply(snapshot: &Snapshot, changes: &ChangeSet, worktree: &Path) -> Result<()> {
    for path in changes.added.iter().chain(changes.updated.iter()) {
        let entry = snapshot
            .files
            .get(path)
            .with_context(|| format!("Change set names '{}' but snapshot lacks it", path))?;

        let dest = worktree.join(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        match &entry.source {
            Source::Disk(src) => {
                fs::copy(src, &dest).with_context(|| {
                    format!("Failed to copy {} -> {}", src.display(), dest.display())
                })?;
            }
            Source::Inline(bytes) => {
                fs::write(&dest, bytes)
                    .with_context(|| format!("Failed to write {}", dest.display()))?;
            }
        }
    }

    for path in &changes.removed {
        let dest = worktree.join(path);
        fs::remove_file(&dest)
            .with_context(|| format!("Failed to remove {}", dest.display()))?;
        prune_empty_dirs(dest.parent(), worktree);
    }

    Ok(())
}

/// Remove now-empty directories left behind by deletions, up to the
/// worktree root.
fn prune_empty_dirs(mut dir: Option<&Path>, worktree: &Path) {
    while let Some(current) = dir {
        if current == worktree {
            break;
        }
        // Only empty directories are removable; stop at the first one
        // that isn't.
        if fs::remove_dir(current).is_err() {
            break;
        }
        dir = current.parent();
    }
}
