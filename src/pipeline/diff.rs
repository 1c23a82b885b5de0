//! Content diff between the build snapshot and the deployed tree

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use super::scan::Snapshot;

/// What a deploy would change on the hosting branch
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// In the build, not on the branch
    pub added: Vec<String>,
    /// On both, content differs
    pub updated: Vec<String>,
    /// On the branch, not in the build
    pub removed: Vec<String>,
    /// Would be removed, but matched a keep pattern
    pub kept: Vec<String>,
    /// Identical content on both sides
    pub unchanged: usize,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// One-line summary: "3 added, 1 updated, 2 removed (14 unchanged)"
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} updated, {} removed ({} unchanged)",
            self.added.len(),
            self.updated.len(),
            self.removed.len(),
            self.unchanged
        )
    }
}

/// Compare the build snapshot against the deployed tree.
///
/// `deployed` maps branch-relative paths to content digests. Paths present
/// on the branch but absent from the snapshot are removals, unless they
/// match a `keep` pattern.
pub fn compute(
    snapshot: &Snapshot,
    deployed: &BTreeMap<String, String>,
    keep: &[String],
) -> Result<ChangeSet> {
    let keep_patterns: Vec<glob::Pattern> = keep
        .iter()
        .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid keep pattern '{}'", p)))
        .collect::<Result<_>>()?;

    let mut changes = ChangeSet::default();

    for (path, entry) in &snapshot.files {
        match deployed.get(path) {
            None => changes.added.push(path.clone()),
            Some(digest) if *digest != entry.digest => changes.updated.push(path.clone()),
            Some(_) => changes.unchanged += 1,
        }
    }

    for path in deployed.keys() {
        if snapshot.files.contains_key(path) {
            continue;
        }
        if keep_patterns.iter().any(|p| p.matches(path)) {
            changes.kept.push(path.clone());
        } else {
            changes.removed.push(path.clone());
        }
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::scan::hash_bytes;

    fn snapshot_of(files: &[(&str, &[u8])]) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for (path, content) in files {
            snapshot.add_inline(path, content.to_vec());
        }
        snapshot
    }

    fn deployed_of(files: &[(&str, &[u8])]) -> BTreeMap<String, String> {
        files
            .iter()
            .map(|(path, content)| (path.to_string(), hash_bytes(content)))
            .collect()
    }

    #[test]
    fn test_first_deploy_is_all_adds() {
        let snapshot = snapshot_of(&[("index.html", b"a"), ("app.js", b"b")]);
        let changes = compute(&snapshot, &BTreeMap::new(), &[]).unwrap();

        assert_eq!(changes.added.len(), 2);
        assert!(changes.updated.is_empty());
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn test_identical_trees_are_empty() {
        let snapshot = snapshot_of(&[("index.html", b"a")]);
        let deployed = deployed_of(&[("index.html", b"a")]);

        let changes = compute(&snapshot, &deployed, &[]).unwrap();
        assert!(changes.is_empty());
        assert_eq!(changes.unchanged, 1);
    }

    #[test]
    fn test_content_change_is_update() {
        let snapshot = snapshot_of(&[("index.html", b"new")]);
        let deployed = deployed_of(&[("index.html", b"old")]);

        let changes = compute(&snapshot, &deployed, &[]).unwrap();
        assert_eq!(changes.updated, vec!["index.html"]);
    }

    #[test]
    fn test_stale_files_are_removed() {
        let snapshot = snapshot_of(&[("index.html", b"a")]);
        let deployed = deployed_of(&[("index.html", b"a"), ("old-page.html", b"x")]);

        let changes = compute(&snapshot, &deployed, &[]).unwrap();
        assert_eq!(changes.removed, vec!["old-page.html"]);
    }

    #[test]
    fn test_keep_patterns_survive() {
        let snapshot = snapshot_of(&[("index.html", b"a")]);
        let deployed = deployed_of(&[
            ("index.html", b"a"),
            ("CNAME", b"www.example.com\n"),
            ("old-page.html", b"x"),
        ]);

        let changes = compute(&snapshot, &deployed, &["CNAME".to_string()]).unwrap();
        assert_eq!(changes.kept, vec!["CNAME"]);
        assert_eq!(changes.removed, vec!["old-page.html"]);
    }

    #[test]
    fn test_summary_format() {
        let snapshot = snapshot_of(&[("a", b"1"), ("b", b"2")]);
        let deployed = deployed_of(&[("b", b"old"), ("c", b"3")]);

        let changes = compute(&snapshot, &deployed, &[]).unwrap();
        assert_eq!(changes.summary(), "1 added, 1 updated, 1 removed (0 unchanged)");
    }
}
