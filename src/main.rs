use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pagepress::config::Overrides;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Publish a build directory to a hosting branch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Config overrides shared by the deploy-shaped subcommands
#[derive(Args, Clone)]
struct DeployArgs {
    /// Build directory to publish
    #[arg(long)]
    dir: Option<String>,

    /// Hosting branch on the remote
    #[arg(long)]
    branch: Option<String>,

    /// Repository URL (defaults to the configured remote)
    #[arg(long)]
    repo: Option<String>,

    /// Remote name used to resolve the repository URL
    #[arg(long)]
    remote: Option<String>,
}

impl DeployArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            dir: self.dir.clone(),
            branch: self.branch.clone(),
            repo: self.repo.clone(),
            remote: self.remote.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the build directory to the hosting branch
    Deploy {
        #[command(flatten)]
        args: DeployArgs,

        /// Commit message for this deploy
        #[arg(short, long)]
        message: Option<String>,

        /// Include dotfiles from the build directory
        #[arg(long)]
        dotfiles: bool,

        /// Show what would change without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Commit locally but skip the push
        #[arg(long)]
        no_push: bool,

        /// Allow publishing an empty build directory
        #[arg(long)]
        force: bool,
    },

    /// Show what a deploy would change, plus recent deploy history
    Status {
        #[command(flatten)]
        args: DeployArgs,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Move the hosting branch back to an earlier deployed commit
    Rollback {
        #[command(flatten)]
        args: DeployArgs,

        /// Commit to roll back to (defaults to the previous deploy)
        #[arg(long)]
        to: Option<String>,
    },

    /// Remove cache clones
    Clean {
        #[command(flatten)]
        args: DeployArgs,

        /// Remove the caches for all remotes, not just this project's
        #[arg(long)]
        all: bool,
    },

    /// Check the deploy environment
    Doctor {
        #[command(flatten)]
        args: DeployArgs,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Write a starter pagepress.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Show version information
    Version {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            args,
            message,
            dotfiles,
            dry_run,
            no_push,
            force,
        } => {
            let mut overrides = args.overrides();
            overrides.message = message;
            if dotfiles {
                overrides.dotfiles = Some(true);
            }
            commands::deploy::execute(overrides, dry_run, no_push, force)?;
        }
        Commands::Status { args, json } => {
            commands::status::execute(args.overrides(), json)?;
        }
        Commands::Rollback { args, to } => {
            commands::rollback::execute(args.overrides(), to)?;
        }
        Commands::Clean { args, all } => {
            commands::clean::execute(args.overrides(), all)?;
        }
        Commands::Doctor { args, json } => {
            let exit_code = commands::doctor::execute(args.overrides(), json)?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Commands::Init { force } => {
            commands::init::execute(force)?;
        }
        Commands::Version { json } => {
            commands::version::execute(json)?;
        }
    }

    Ok(())
}
