//! Deploy configuration
//!
//! Loaded from `pagepress.toml` in the project directory when present,
//! otherwise defaults apply. CLI flags override individual fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths;

/// Configuration for a deploy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Build directory to publish (relative to project root)
    pub dir: String,
    /// Hosting branch on the remote
    pub branch: String,
    /// Explicit repository URL. When unset, resolved from `remote`.
    pub repo: Option<String>,
    /// Remote name used to resolve the repository URL
    pub remote: String,
    /// Commit message for each deploy
    pub message: String,
    /// Include dotfiles from the build directory
    pub dotfiles: bool,
    /// Glob patterns selecting which build files to publish
    pub src: Vec<String>,
    /// Glob patterns for files on the hosting branch that survive every
    /// deploy even when absent from the build directory (e.g. "CNAME")
    pub keep: Vec<String>,
    /// Custom domain: writes a CNAME file onto the hosting branch
    pub cname: Option<String>,
    /// Write a .nojekyll marker onto the hosting branch
    pub nojekyll: bool,
    /// Push attempts before giving up
    pub push_retries: u32,
    /// Delay between push attempts, in milliseconds
    pub retry_delay_ms: u64,
    /// Commit identity for deploy commits. When unset, the git config of
    /// the environment applies, with a neutral fallback if none exists.
    pub user: Option<UserIdent>,
}

/// Name and email for deploy commits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdent {
    pub name: String,
    pub email: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            dir: "dist".to_string(),
            branch: "gh-pages".to_string(),
            repo: None,
            remote: "origin".to_string(),
            message: "Updates".to_string(),
            dotfiles: false,
            src: vec!["**/*".to_string()],
            keep: Vec::new(),
            cname: None,
            nojekyll: false,
            push_retries: 3,
            retry_delay_ms: 1000,
            user: None,
        }
    }
}

/// Field-wise overrides collected from CLI flags
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dir: Option<String>,
    pub branch: Option<String>,
    pub repo: Option<String>,
    pub remote: Option<String>,
    pub message: Option<String>,
    pub dotfiles: Option<bool>,
}

impl DeployConfig {
    /// Load config from `{root}/pagepress.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI flag overrides on top of the loaded config
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(dir) = &overrides.dir {
            self.dir = dir.clone();
        }
        if let Some(branch) = &overrides.branch {
            self.branch = branch.clone();
        }
        if let Some(repo) = &overrides.repo {
            self.repo = Some(repo.clone());
        }
        if let Some(remote) = &overrides.remote {
            self.remote = remote.clone();
        }
        if let Some(message) = &overrides.message {
            self.message = message.clone();
        }
        if let Some(dotfiles) = overrides.dotfiles {
            self.dotfiles = dotfiles;
        }
    }

    /// Absolute build directory, with `~` expanded
    pub fn build_dir(&self, root: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(&self.dir);
        let path = PathBuf::from(expanded.as_ref());
        if path.is_absolute() {
            path
        } else {
            root.join(path)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.branch.trim().is_empty() {
            anyhow::bail!("Config error: 'branch' must not be empty");
        }
        if self.dir.trim().is_empty() {
            anyhow::bail!("Config error: 'dir' must not be empty");
        }
        if self.push_retries == 0 {
            anyhow::bail!("Config error: 'push_retries' must be at least 1");
        }
        for pattern in self.src.iter().chain(self.keep.iter()) {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Config error: invalid glob pattern '{}'", pattern))?;
        }
        Ok(())
    }
}

/// Starter config written by `pagepress init`
pub const STARTER_CONFIG: &str = r#"# pagepress deploy configuration
# Every key is optional; the values below are the defaults.

# Build directory to publish
dir = "dist"

# Hosting branch on the remote
branch = "gh-pages"

# Repository URL. Leave unset to use the 'origin' remote of the
# surrounding git repository.
# repo = "git@github.com:owner/site.git"

# Commit message for each deploy
message = "Updates"

# Include dotfiles from the build directory
dotfiles = false

# Files on the hosting branch that survive every deploy
# keep = ["CNAME"]

# Custom domain (writes a CNAME file)
# cname = "www.example.com"

# Disable Jekyll processing on GitHub Pages
# nojekyll = true

# Commit identity for deploy commits
# [user]
# name = "Deploy Bot"
# email = "deploy@example.com"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_match_original_script() {
        let config = DeployConfig::default();
        assert_eq!(config.dir, "dist");
        assert_eq!(config.branch, "gh-pages");
        assert_eq!(config.remote, "origin");
        assert!(!config.dotfiles);
        assert!(config.repo.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = DeployConfig::load(tmp.path()).unwrap();
        assert_eq!(config.branch, "gh-pages");
    }

    #[test]
    fn test_load_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("pagepress.toml"),
            "dir = \"public\"\ncname = \"www.example.com\"\n",
        )
        .unwrap();

        let config = DeployConfig::load(tmp.path()).unwrap();
        assert_eq!(config.dir, "public");
        assert_eq!(config.cname.as_deref(), Some("www.example.com"));
        // Untouched fields keep their defaults
        assert_eq!(config.branch, "gh-pages");
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("pagepress.toml"), "keep = [\"[\"]\n").unwrap();
        assert!(DeployConfig::load(tmp.path()).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = DeployConfig::default();
        config.apply(&Overrides {
            branch: Some("pages".to_string()),
            dotfiles: Some(true),
            ..Default::default()
        });
        assert_eq!(config.branch, "pages");
        assert!(config.dotfiles);
        // Untouched fields survive
        assert_eq!(config.dir, "dist");
    }

    #[test]
    fn test_build_dir_resolution() {
        let config = DeployConfig::default();
        let root = Path::new("/home/user/site");
        assert_eq!(
            config.build_dir(root),
            PathBuf::from("/home/user/site/dist")
        );

        let mut absolute = DeployConfig::default();
        absolute.dir = "/tmp/out".to_string();
        assert_eq!(absolute.build_dir(root), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_starter_config_parses() {
        let config: DeployConfig = toml::from_str(STARTER_CONFIG).unwrap();
        assert_eq!(config.dir, "dist");
        assert_eq!(config.branch, "gh-pages");
    }
}
