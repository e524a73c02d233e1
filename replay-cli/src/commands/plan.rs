//! Plan command - show what a run would mirror

use anyhow::Context;
use clap::Args;
use replay_core::replay::abbreviate;
use replay_core::{Config, Mirror, PlanReport, Secrets};

use super::MirrorArgs;

/// Arguments for the plan command
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    #[command(flatten)]
    pub mirror: MirrorArgs,
}

impl PlanArgs {
    /// Execute the plan command
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let credentials = Secrets::load()?.credentials();
        let mirror = Mirror::new(config, credentials)?;

        let plan = tokio::task::spawn_blocking(move || mirror.plan())
            .await
            .context("Plan task panicked")?
            .context("Planning failed")?;

        if self.mirror.json {
            println!("{}", plan.to_json()?);
        } else {
            print_plan(&plan);
        }

        Ok(())
    }
}

fn print_plan(plan: &PlanReport) {
    println!("Replay Plan");
    println!("===========");
    println!();
    println!("Policy: {}", plan.policy);
    println!("Source: {} at {}", plan.source_branch, abbreviate(&plan.source_tip));
    println!("Target: {}", plan.target_branch);
    match &plan.last_mirrored {
        Some(id) => println!("Last mirrored: {}", id),
        None => println!("Last mirrored: (none)"),
    }
    println!(
        "Selected: {} of {} first-parent commits ({} already mirrored)",
        plan.selected, plan.history_len, plan.already_mirrored
    );
    println!();

    if plan.pending.is_empty() {
        println!("Nothing to replay.");
        return;
    }

    println!("Pending ({}):", plan.pending.len());
    for commit in &plan.pending {
        let marker = if commit.merge { " [merge]" } else { "" };
        println!(
            "  {} {}{} ({})",
            abbreviate(&commit.id),
            commit.summary,
            marker,
            commit.author
        );
    }
}
