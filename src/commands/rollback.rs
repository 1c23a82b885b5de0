use anyhow::{Context, Result};
use pagepress::config::{DeployConfig, Overrides};
use pagepress::paths;
use pagepress::pipeline;

pub fn execute(overrides: Overrides, to: Option<String>) -> Result<()> {
    let root = std::env::current_dir().context("Failed to resolve current directory")?;

    let mut config = DeployConfig::load(&root)?;
    config.apply(&overrides);

    println!("⏪ Rolling back '{}'...", config.branch);

    let outcome = pipeline::rollback(
        &config,
        &root,
        &paths::repos_cache_dir(),
        to.as_deref(),
    )?;

    println!(
        "✓ {} moved {} → {}",
        outcome.branch,
        &outcome.from[..12],
        &outcome.to[..12]
    );
    println!("✨ Rollback pushed to {}", outcome.url);

    Ok(())
}
