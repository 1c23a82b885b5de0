use anyhow::{Context, Result};
use colored::Colorize;
use pagepress::config::{DeployConfig, Overrides};
use pagepress::journal::Journal;
use pagepress::paths;
use pagepress::pipeline;
use serde_json::json;

pub fn execute(overrides: Overrides, json: bool) -> Result<()> {
    let root = std::env::current_dir().context("Failed to resolve current directory")?;

    let mut config = DeployConfig::load(&root)?;
    config.apply(&overrides);

    if !json {
        println!("🔍 Comparing {} against '{}'...", config.dir, config.branch);
    }

    let (changes, target, remote_tip) =
        pipeline::preview(&config, &root, &paths::repos_cache_dir())?;
    let journal = Journal::load(&target.journal_path)?;

    if json {
        let output = json!({
            "repo": target.url,
            "branch": config.branch,
            "branch_exists": remote_tip.is_some(),
            "remote_tip": remote_tip,
            "up_to_date": changes.is_empty(),
            "added": changes.added,
            "updated": changes.updated,
            "removed": changes.removed,
            "kept": changes.kept,
            "unchanged": changes.unchanged,
            "deploys": journal.records,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("📍 Repo: {}", target.url);
    match &remote_tip {
        Some(tip) => println!("📍 Branch '{}' at {}", config.branch, &tip[..12]),
        None => println!("📍 Branch '{}' does not exist yet", config.branch),
    }

    if changes.is_empty() {
        println!("✓ Up to date, a deploy would change nothing");
    } else {
        println!("Changes a deploy would make:");
        for path in &changes.added {
            println!("  {} {}", "+".green(), path);
        }
        for path in &changes.updated {
            println!("  {} {}", "~".yellow(), path);
        }
        for path in &changes.removed {
            println!("  {} {}", "-".red(), path);
        }
        for path in &changes.kept {
            println!("  {} {} (kept)", "=".blue(), path);
        }
        println!("  {}", changes.summary());
    }

    if !journal.records.is_empty() {
        println!("\nRecent deploys:");
        for record in journal.records.iter().rev().take(5) {
            let push_marker = if record.pushed { "" } else { " (not pushed)" };
            println!(
                "  {} {} {}{}",
                record.timestamp.format("%Y-%m-%d %H:%M"),
                &record.commit[..12.min(record.commit.len())],
                record.message,
                push_marker
            );
        }
    }

    Ok(())
}
