//! Pipeline command handlers
//!
//! Handles checking definition files locally and submitting them to the daemon.

use anyhow::{Context, Result};
use chief_core::domain::pipeline::{PipelineSpec, Step};
use chief_core::domain::run::Phase;
use chief_core::parse_definition;
use clap::Subcommand;
use colored::*;

use crate::commands::run::print_run_details;
use crate::config::Config;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Parse a definition file and print the resulting pipeline
    Check {
        /// Path to the definition file
        file: String,
    },
    /// Submit a definition file to the daemon
    Submit {
        /// Path to the definition file
        file: String,

        /// Wait for the run to finish and print its log
        #[arg(short, long)]
        wait: bool,
    },
}

/// Handle pipeline commands
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::Check { file } => {
            let (_, spec) = read_definition(&file)?;
            println!("{}", "✓ Pipeline definition is valid".green().bold());
            println!();
            print_spec(&spec);
            Ok(())
        }
        PipelineCommands::Submit { file, wait } => submit(config, &file, wait).await,
    }
}

/// Read and parse a definition file, returning its text and the parsed spec
fn read_definition(file: &str) -> Result<(String, PipelineSpec)> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read definition file: {}", file))?;
    let spec = parse_definition(&text).with_context(|| format!("Invalid definition: {}", file))?;
    Ok((text, spec))
}

/// Submit a definition, optionally waiting for the run to finish
async fn submit(config: &Config, file: &str, wait: bool) -> Result<()> {
    let (text, spec) = read_definition(file)?;
    let client = config.authorized_client()?;

    let accepted = client
        .submit(&text)
        .await
        .context("Failed to submit pipeline")?;

    println!("{}", "✓ Pipeline submitted".green().bold());
    println!("  Run ID:     {}", accepted.run_id.to_string().cyan());
    println!("  Repository: {}", spec.repository_url());

    if !wait {
        println!();
        println!(
            "Follow it with: {}",
            format!("chief status {}", accepted.run_id).cyan()
        );
        return Ok(());
    }

    println!();
    println!("{}", "Waiting for the run to finish...".dimmed());
    let run = client.get_run(accepted.run_id, true).await?;
    println!();
    print_run_details(&run);

    if run.phase == Phase::Failed {
        anyhow::bail!("run {} failed", run.id);
    }
    Ok(())
}

fn print_spec(spec: &PipelineSpec) {
    println!("{}", "Pipeline:".bold());
    println!("  Repository: {}", spec.repository_url().cyan());
    print_steps("Build", spec.build_steps());
    print_steps("Deploy", spec.deploy_steps());
}

fn print_steps(label: &str, steps: &[Step]) {
    println!("\n{}", format!("{} steps ({}):", label, steps.len()).bold());
    if steps.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (i, step) in steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}
