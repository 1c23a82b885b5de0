//! Per-remote deploy journal
//!
//! A JSON log stored next to the cache clone. `status` reads it for
//! history; `rollback` uses it to find the previous deployed commit.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One deploy (or rollback) against a remote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRecord {
    pub timestamp: DateTime<Utc>,
    /// Commit the hosting branch pointed at after this entry
    pub commit: String,
    /// Commit the branch pointed at before (None for the first deploy)
    pub previous: Option<String>,
    pub message: String,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// False when the run used --no-push
    pub pushed: bool,
}

/// The journal for one remote
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
    pub records: Vec<DeployRecord>,
}

impl Journal {
    /// Load a journal, returning an empty one when the file is missing
    pub fn load(path: &Path) -> Result<Self> {
        let records = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Corrupt deploy journal at {}", path.display()))?
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Append a record and persist
    pub fn append(&mut self, record: DeployRecord) -> Result<()> {
        self.records.push(record);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&DeployRecord> {
        self.records.last()
    }

    /// The commit to roll back to, given the branch's current tip.
    ///
    /// Only trusted when the journal actually recorded the current tip;
    /// a tip deployed by someone else means our history is not authoritative.
    pub fn rollback_target(&self, current_tip: &str) -> Option<&str> {
        self.records
            .iter()
            .rev()
            .find(|r| r.pushed && r.commit == current_tip)
            .and_then(|r| r.previous.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(commit: &str, previous: Option<&str>) -> DeployRecord {
        DeployRecord {
            timestamp: Utc::now(),
            commit: commit.to_string(),
            previous: previous.map(|s| s.to_string()),
            message: "Updates".to_string(),
            added: 1,
            updated: 0,
            removed: 0,
            pushed: true,
        }
    }

    #[test]
    fn test_load_missing_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let journal = Journal::load(&tmp.path().join("journal.json")).unwrap();
        assert!(journal.records.is_empty());
    }

    #[test]
    fn test_append_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("journal.json");

        let mut journal = Journal::load(&path).unwrap();
        journal.append(record("aaa", None)).unwrap();
        journal.append(record("bbb", Some("aaa"))).unwrap();

        let reloaded = Journal::load(&path).unwrap();
        assert_eq!(reloaded.records.len(), 2);
        assert_eq!(reloaded.last().unwrap().commit, "bbb");
    }

    #[test]
    fn test_rollback_target_matches_tip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("journal.json");

        let mut journal = Journal::load(&path).unwrap();
        journal.append(record("aaa", None)).unwrap();
        journal.append(record("bbb", Some("aaa"))).unwrap();

        assert_eq!(journal.rollback_target("bbb"), Some("aaa"));
        // Tip we never deployed: refuse to guess
        assert_eq!(journal.rollback_target("ccc"), None);
        // First deploy has nothing before it
        assert_eq!(journal.rollback_target("aaa"), None);
    }

    #[test]
    fn test_corrupt_journal_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("journal.json");
        fs::write(&path, "not json").unwrap();
        assert!(Journal::load(&path).is_err());
    }
}
