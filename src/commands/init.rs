use anyhow::{Context, Result};
use pagepress::config::STARTER_CONFIG;
use pagepress::paths;
use std::fs;

pub fn execute(force: bool) -> Result<()> {
    let root = std::env::current_dir().context("Failed to resolve current directory")?;
    let path = paths::config_path(&root);

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists\n\
             \n\
             Edit it directly, or pass --force to overwrite it with the\n\
             starter config.",
            path.display()
        );
    }

    fs::write(&path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✓ Wrote {}", path.display());
    println!("✨ Edit it, build your site, then run 'pagepress deploy'");

    Ok(())
}
