//! Build directory snapshot
//!
//! Walks the build directory and records a SHA-256 digest for every file
//! to publish. Change detection downstream is by content hash only, never
//! by mtime or size.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where a snapshot entry's bytes come from when staged
#[derive(Debug, Clone)]
pub enum Source {
    /// A file in the build directory
    Disk(PathBuf),
    /// Generated content (CNAME, .nojekyll)
    Inline(Vec<u8>),
}

/// One file in the snapshot
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub digest: String,
    pub source: Source,
}

/// Content snapshot of the build directory.
///
/// Keys are worktree-relative paths with `/` separators, sorted for
/// deterministic diff and summary output.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub files: BTreeMap<String, FileEntry>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Add generated content to the snapshot.
    ///
    /// Inline entries go through the same diff as build files, so a CNAME
    /// that already matches on the hosting branch causes no commit.
    pub fn add_inline(&mut self, rel_path: &str, bytes: Vec<u8>) {
        let digest = hash_bytes(&bytes);
        self.files.insert(
            rel_path.to_string(),
            FileEntry {
                digest,
                source: Source::Inline(bytes),
            },
        );
    }
}

/// Hash a file's content (streaming, so large assets don't load into memory)
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash in-memory content
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Snapshot a build directory.
///
/// `src_patterns` select which files to include (matched against the
/// relative path). Dotfiles are skipped unless `dotfiles` is set; a `.git`
/// directory inside the build output is always skipped.
pub fn scan(build_dir: &Path, dotfiles: bool, src_patterns: &[String]) -> Result<Snapshot> {
    if !build_dir.exists() {
        anyhow::bail!(
            "Build directory not found: {}\n\
             \n\
             Run your site build first, or point 'dir' in pagepress.toml\n\
             at the right output directory.",
            build_dir.display()
        );
    }
    if !build_dir.is_dir() {
        anyhow::bail!("Not a directory: {}", build_dir.display());
    }

    let patterns: Vec<glob::Pattern> = src_patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p).with_context(|| format!("Invalid src pattern '{}'", p))
        })
        .collect::<Result<_>>()?;

    let mut snapshot = Snapshot::default();

    for entry in WalkDir::new(build_dir).follow_links(false) {
        let entry = entry.context("Failed to walk build directory")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(build_dir)
            .context("Walked outside build directory")?;
        let rel_str = rel_path_string(rel);

        if is_excluded(&rel_str, dotfiles) {
            continue;
        }
        if !patterns.iter().any(|p| p.matches(&rel_str)) {
            continue;
        }

        let digest = hash_file(entry.path())?;
        snapshot.files.insert(
            rel_str,
            FileEntry {
                digest,
                source: Source::Disk(entry.path().to_path_buf()),
            },
        );
    }

    Ok(snapshot)
}

/// Hash every file currently on the hosting branch's worktree.
///
/// Dotfiles are deployed state here (.nojekyll and friends), so nothing
/// except `.git` is skipped.
pub fn deployed_state(worktree: &Path) -> Result<BTreeMap<String, String>> {
    let mut state = BTreeMap::new();

    for entry in WalkDir::new(worktree)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name().to_str() != Some(".git"))
    {
        let entry = entry.context("Failed to walk deployed worktree")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(worktree)
            .context("Walked outside worktree")?;
        state.insert(rel_path_string(rel), hash_file(entry.path())?);
    }

    Ok(state)
}

fn rel_path_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_excluded(rel_path: &str, dotfiles: bool) -> bool {
    for component in rel_path.split('/') {
        if component == ".git" {
            return true;
        }
        if !dotfiles && component.starts_with('.') {
            return true;
        }
    }
    false
}
