use anyhow::{Context, Result};
use pagepress::config::{DeployConfig, Overrides};
use pagepress::git::cache_key;
use pagepress::paths;
use pagepress::pipeline;
use std::fs;

pub fn execute(overrides: Overrides, all: bool) -> Result<()> {
    let repos_dir = paths::repos_cache_dir();

    if all {
        if repos_dir.exists() {
            fs::remove_dir_all(&repos_dir)
                .with_context(|| format!("Failed to remove {}", repos_dir.display()))?;
            println!("✓ Removed all cache clones under {}", repos_dir.display());
        } else {
            println!("ℹ️  Cache is already empty");
        }
        return Ok(());
    }

    let root = std::env::current_dir().context("Failed to resolve current directory")?;
    let mut config = DeployConfig::load(&root)?;
    config.apply(&overrides);

    let url = pipeline::resolve_url(&config, &root)?;
    let entry = paths::repo_cache_dir(&repos_dir, &cache_key(&url));

    if entry.exists() {
        fs::remove_dir_all(&entry)
            .with_context(|| format!("Failed to remove {}", entry.display()))?;
        println!("✓ Removed cache for {}", url);
    } else {
        println!("ℹ️  No cache for {}", url);
    }

    Ok(())
}
