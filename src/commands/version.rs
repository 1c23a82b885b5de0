use anyhow::Result;
use serde_json::json;
use std::process::Command;

const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn execute(json: bool) -> Result<()> {
    let git_version = Command::new("git")
        .arg("--version")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().replace("git version ", ""));

    if json {
        let output = json!({
            "pagepress": CORE_VERSION,
            "git": git_version,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("pagepress {CORE_VERSION}");
        if let Some(version) = git_version {
            println!("git {version}");
        }
    }

    Ok(())
}
