use anyhow::{Context, Result};
use colored::Colorize;
use pagepress::config::{DeployConfig, Overrides};
use pagepress::git::parse_owner_repo;
use pagepress::paths;
use pagepress::pipeline::{self, PublishOptions};

pub fn execute(overrides: Overrides, dry_run: bool, no_push: bool, force: bool) -> Result<()> {
    let root = std::env::current_dir().context("Failed to resolve current directory")?;

    let mut config = DeployConfig::load(&root)?;
    config.apply(&overrides);

    let url = pipeline::resolve_url(&config, &root)?;
    match parse_owner_repo(&url) {
        Some((owner, repo)) => println!(
            "🚀 Deploying {} to {}/{} ({})",
            config.dir, owner, repo, config.branch
        ),
        None => println!("🚀 Deploying {} to {} ({})", config.dir, url, config.branch),
    }

    let opts = PublishOptions {
        dry_run,
        no_push,
        force,
    };
    let outcome = pipeline::deploy(&config, &root, &paths::repos_cache_dir(), &opts)?;

    if dry_run {
        println!("🔍 Dry run: {}", outcome.changes.summary());
        for path in &outcome.changes.added {
            println!("  {} {}", "+".green(), path);
        }
        for path in &outcome.changes.updated {
            println!("  {} {}", "~".yellow(), path);
        }
        for path in &outcome.changes.removed {
            println!("  {} {}", "-".red(), path);
        }
        return Ok(());
    }

    if outcome.changes.is_empty() {
        println!("✓ Already up to date, nothing to deploy");
        return Ok(());
    }

    match &outcome.commit {
        Some(sha) if outcome.pushed => {
            if outcome.branch_created {
                println!("✓ Created branch '{}'", outcome.branch);
            }
            println!("✓ {}", outcome.changes.summary());
            println!("✨ Deployed as {}", &sha[..12]);
        }
        Some(sha) => {
            println!("✓ {}", outcome.changes.summary());
            println!("✓ Committed {} locally (push skipped)", &sha[..12]);
        }
        None => {}
    }

    Ok(())
}
