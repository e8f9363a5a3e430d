//! Run command handlers
//!
//! Handles listing runs, viewing details, and reading logs.

use anyhow::Result;
use chief_core::domain::run::{Phase, Run};
use chief_core::dto::run::RunSummary;
use clap::Subcommand;
use colored::*;

use crate::config::Config;
use crate::id_resolver::resolve_run_id;
use crate::types::IdOrPrefix;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// List all runs
    List,
    /// Get run details
    Get {
        /// Run ID or unambiguous prefix
        id: String,

        /// Wait for the run to finish
        #[arg(short, long)]
        wait: bool,
    },
    /// Get run logs
    Logs {
        /// Run ID or unambiguous prefix
        id: String,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    match command {
        RunCommands::List => list_runs(config).await,
        RunCommands::Get { id, wait } => {
            let run = fetch_run(config, &id, wait).await?;
            print_run_details(&run);
            Ok(())
        }
        RunCommands::Logs { id } => {
            let run = fetch_run(config, &id, false).await?;
            print_log(&run);
            Ok(())
        }
    }
}

/// Print a run's phase and log
pub async fn show_run(config: &Config, id: &str) -> Result<()> {
    let run = fetch_run(config, id, false).await?;
    print_run_details(&run);
    Ok(())
}

async fn fetch_run(config: &Config, id: &str, wait: bool) -> Result<Run> {
    let client = config.client();
    let id = resolve_run_id(&client, &IdOrPrefix::parse(id)).await?;
    Ok(client.get_run(id, wait).await?)
}

async fn list_runs(config: &Config) -> Result<()> {
    let runs = config.client().list_runs().await?;

    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", runs.len()).bold());
        println!();
        for run in &runs {
            print_run_summary(run);
        }
    }

    Ok(())
}

/// Print a run summary
fn print_run_summary(run: &RunSummary) {
    println!("  {} Run {}", "▸".cyan(), run.id.to_string().dimmed());
    println!("    Repository: {}", run.repository_url);
    println!("    Phase:      {}", colorize_phase(run.phase));
    println!(
        "    Submitted:  {}",
        run.submitted_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed run information followed by its log
pub fn print_run_details(run: &Run) {
    println!("{}", "Run Details:".bold());
    println!("  ID:         {}", run.id.to_string().cyan());
    println!("  Repository: {}", run.spec.repository_url());
    println!("  Phase:      {}", colorize_phase(run.phase));
    println!(
        "  Submitted:  {}",
        run.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(started) = run.started_at {
        println!("  Started:    {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(finished) = run.finished_at {
        println!("  Finished:   {}", finished.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = run.started_at {
            let duration = finished.signed_duration_since(started);
            println!("  Duration:   {}s", duration.num_seconds());
        }
    }

    if let Some(error) = &run.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.to_string().red());
    }

    println!();
    print_log(run);
}

fn print_log(run: &Run) {
    if run.log.is_empty() {
        println!("{}", "No log entries yet.".yellow());
        return;
    }

    println!("{}", format!("Log for run {}:", run.id).bold());
    println!("{}", "─".repeat(80).dimmed());
    for entry in &run.log {
        if entry.starts_with("phase ") {
            println!("{}", entry.cyan());
        } else {
            println!("{}", entry);
        }
    }
    println!("{}", "─".repeat(80).dimmed());
}

/// Colorize a run phase for display
fn colorize_phase(phase: Phase) -> ColoredString {
    let phase_str = phase.to_string();
    match phase {
        Phase::Pending => phase_str.yellow(),
        Phase::Fetching | Phase::Building | Phase::Deploying => phase_str.cyan(),
        Phase::Succeeded => phase_str.green(),
        Phase::Failed => phase_str.red(),
    }
}
