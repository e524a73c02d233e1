//! Run command - replay pending commits and push them

use anyhow::Context;
use clap::Args;
use replay_core::replay::short_id;
use replay_core::{Config, Mirror, ReplayEvent, ReplayReport, RunOptions, Secrets};

use super::MirrorArgs;

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub mirror: MirrorArgs,

    /// Replay into the local clone only; never push
    #[arg(long)]
    pub dry_run: bool,

    /// Create the commits but skip the push
    #[arg(long)]
    pub no_push: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, verbose: bool, config: Config) -> anyhow::Result<()> {
        let credentials = Secrets::load()?.credentials();
        let mirror = Mirror::new(config, credentials)?;
        let options = RunOptions {
            dry_run: self.dry_run,
            no_push: self.no_push,
        };
        let quiet = self.mirror.json;

        if verbose {
            tracing::info!(?options, "Starting replay");
        }

        let report = tokio::task::spawn_blocking(move || {
            mirror.run(options, |event| {
                if !quiet {
                    print_event(event);
                }
            })
        })
        .await
        .context("Replay task panicked")?
        .context("Replay failed")?;

        if self.mirror.json {
            println!("{}", report.to_json()?);
        } else {
            print_report(&report);
        }

        Ok(())
    }
}

fn print_event(event: ReplayEvent<'_>) {
    match event {
        ReplayEvent::Replaying { index, total, entry } => {
            println!("[{}/{}] {} {}", index, total, entry.short_id(), entry.summary);
        }
        ReplayEvent::Skipped { entry } => {
            println!("      unchanged tree, skipped {}", entry.short_id());
        }
        ReplayEvent::Committed { target, .. } => {
            println!("      -> {}", short_id(target));
        }
    }
}

fn print_report(report: &ReplayReport) {
    println!();
    println!(
        "Replayed {} onto {} ({})",
        report.source_branch, report.target_branch, report.policy
    );
    println!("  Selected: {}", report.selected);
    println!("  Already mirrored: {}", report.already_mirrored);
    println!("  Created: {}", report.created_count());
    if !report.skipped.is_empty() {
        println!("  Skipped: {}", report.skipped.len());
    }

    if report.created.is_empty() {
        println!("Target is up to date.");
    } else if report.pushed {
        println!("Pushed {}.", report.target_branch);
    } else if report.dry_run {
        println!("[Dry run] Nothing was pushed.");
    } else {
        println!("Push skipped (--no-push).");
    }
}
