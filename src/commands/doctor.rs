use anyhow::{Context, Result};
use colored::Colorize;
use pagepress::config::{DeployConfig, Overrides};
use pagepress::git;
use serde::Serialize;
use serde_json::json;
use std::process::Command;

#[derive(Serialize)]
struct Check {
    name: String,
    ok: bool,
    detail: String,
}

pub fn execute(overrides: Overrides, json: bool) -> Result<i32> {
    let root = std::env::current_dir().context("Failed to resolve current directory")?;
    let mut checks = Vec::new();

    // git binary
    match which::which("git") {
        Ok(path) => {
            let version = Command::new("git")
                .arg("--version")
                .output()
                .ok()
                .and_then(|o| String::from_utf8(o.stdout).ok())
                .map(|s| s.trim().replace("git version ", ""))
                .unwrap_or_else(|| "unknown".to_string());
            checks.push(Check {
                name: "git".to_string(),
                ok: true,
                detail: format!("{} ({})", version, path.display()),
            });
        }
        Err(_) => checks.push(Check {
            name: "git".to_string(),
            ok: false,
            detail: "not found on PATH".to_string(),
        }),
    }

    // config
    let config = match DeployConfig::load(&root) {
        Ok(mut config) => {
            config.apply(&overrides);
            checks.push(Check {
                name: "config".to_string(),
                ok: true,
                detail: format!("dir={} branch={}", config.dir, config.branch),
            });
            Some(config)
        }
        Err(err) => {
            checks.push(Check {
                name: "config".to_string(),
                ok: false,
                detail: format!("{:#}", err),
            });
            None
        }
    };

    if let Some(config) = &config {
        // build directory
        let build_dir = config.build_dir(&root);
        checks.push(Check {
            name: "build dir".to_string(),
            ok: build_dir.is_dir(),
            detail: if build_dir.is_dir() {
                build_dir.display().to_string()
            } else {
                format!("{} missing (build the site first)", build_dir.display())
            },
        });

        // repository URL
        match pagepress::pipeline::resolve_url(config, &root) {
            Ok(url) => {
                checks.push(Check {
                    name: "repo".to_string(),
                    ok: true,
                    detail: url.clone(),
                });

                // remote reachability; run from the project dir, the cache
                // clone may not exist yet
                match git::ls_remote_head(&root, &url, &config.branch) {
                    Ok(Some(tip)) => checks.push(Check {
                        name: "remote".to_string(),
                        ok: true,
                        detail: format!("reachable, '{}' at {}", config.branch, &tip[..12]),
                    }),
                    Ok(None) => checks.push(Check {
                        name: "remote".to_string(),
                        ok: true,
                        detail: format!(
                            "reachable, '{}' not created yet (first deploy will create it)",
                            config.branch
                        ),
                    }),
                    Err(err) => checks.push(Check {
                        name: "remote".to_string(),
                        ok: false,
                        detail: format!("{:#}", err),
                    }),
                }
            }
            Err(err) => checks.push(Check {
                name: "repo".to_string(),
                ok: false,
                detail: format!("{:#}", err),
            }),
        }
    }

    let healthy = checks.iter().all(|c| c.ok);

    if json {
        let output = json!({
            "status": if healthy { "healthy" } else { "critical" },
            "checks": checks,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("🏥 Checking deploy environment...\n");
        for check in &checks {
            let marker = if check.ok {
                "✓".green()
            } else {
                "✗".red()
            };
            println!("  {} {}: {}", marker, check.name, check.detail);
        }
        println!();
        if healthy {
            println!("✨ Ready to deploy");
        } else {
            println!("⚠️  Fix the failing checks before deploying");
        }
    }

    Ok(if healthy { 0 } else { 1 })
}
