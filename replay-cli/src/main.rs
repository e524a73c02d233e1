//! git-replay CLI - mirror commits from one repository into another
//!
//! Replays the first-parent history of a source branch onto a target branch
//! under a configurable policy, resuming where the previous run stopped.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use replay_core::{Config, Overrides, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{PlanArgs, RunArgs};

/// git-replay: mirror commits between repositories
#[derive(Parser, Debug)]
#[command(name = "git-replay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "REPLAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Replay pending commits onto the target and push
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// Show the commits a run would replay
    #[command(visible_alias = "p")]
    Plan(PlanArgs),

    /// Show current configuration
    Config,

    /// Create a template secrets file
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables already set in the environment win over the file
    let env_file = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match env_file {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => anyhow::bail!("Failed to read .env: {}", e),
    }

    let overrides = match &cli.command {
        Some(Commands::Run(args)) => args.mirror.overrides(),
        Some(Commands::Plan(args)) => args.mirror.overrides(),
        _ => Overrides::default(),
    };
    let config = Config::load_with_overrides(cli.config.as_deref(), overrides)?;

    match cli.command {
        Some(Commands::Version) => {
            println!("git-replay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Run(args)) => {
            args.execute(cli.verbose, config).await?;
        }
        Some(Commands::Plan(args)) => {
            args.execute(config).await?;
        }
        Some(Commands::Config) => {
            print_config(&config, cli.config.as_deref())?;
        }
        Some(Commands::Init) => {
            let path = Secrets::create_template()?;
            println!("Created {}", path.display());
            println!("Add a token with push access to the target repository.");
        }
        None => {
            RunArgs::default().execute(cli.verbose, config).await?;
        }
    }

    Ok(())
}

fn print_config(config: &Config, explicit: Option<&std::path::Path>) -> anyhow::Result<()> {
    let unset = "(not set)";

    println!("git-replay Configuration");
    println!("========================");
    println!();
    println!("Repositories:");
    println!("  owner: {}", config.owner.as_deref().unwrap_or(unset));
    println!("  source: {}", config.source.repo.as_deref().unwrap_or(unset));
    println!(
        "  source_branch: {}",
        config.source.branch.as_deref().unwrap_or("(source HEAD)")
    );
    println!("  target: {}", config.target.repo.as_deref().unwrap_or(unset));
    println!(
        "  target_branch: {}",
        config.target.branch.as_deref().unwrap_or("(same as source)")
    );
    println!();
    println!("Replay Settings:");
    println!("  policy: {}", config.replay.policy);
    println!("  preserve_dates: {}", config.replay.preserve_dates);
    println!("  skip_unchanged: {}", config.replay.skip_unchanged);
    println!("  trailer_key: {}", config.replay.trailer_key);
    println!("  max_listed: {}", config.replay.max_listed);
    match &config.replay.committer {
        Some(id) => println!("  committer: {} <{}>", id.name, id.email),
        None => println!("  committer: (commit author)"),
    }
    if let Some(id) = &config.replay.author_override {
        println!("  author_override: {} <{}>", id.name, id.email);
    }
    if let Some(dir) = &config.workdir {
        println!("  workdir: {}", dir.display());
    }
    println!();

    println!("Credentials:");
    match Secrets::load()?.credentials() {
        Some(creds) => {
            println!("  username: {}", creds.username());
            println!("  token: ********");
        }
        None => println!("  (none; relying on SSH agent or git defaults)"),
    }
    println!();

    let path = explicit
        .map(|p| p.to_path_buf())
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }

    Ok(())
}
