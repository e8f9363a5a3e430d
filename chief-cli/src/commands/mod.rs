//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod access;
mod daemon;
mod pipeline;
mod run;
mod setup;

pub use access::AccessCommands;
pub use pipeline::PipelineCommands;
pub use run::RunCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Set up the chief home and the master user
    Setup {
        /// Master username (prompted if omitted)
        #[arg(long)]
        username: Option<String>,

        /// Master password (prompted if omitted)
        #[arg(long, env = "CHIEF_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
    /// Manage user access
    Access {
        #[command(subcommand)]
        command: AccessCommands,
    },
    /// Start the chief daemon
    Start {
        /// Start the daemon in the background and return
        #[arg(long)]
        detach: bool,
    },
    /// Get the daemon status, or a run's status
    Status {
        /// Run ID or unambiguous prefix
        id: Option<String>,
    },
    /// Stop the chief daemon once in-flight runs finish
    Kill,
    /// Check and submit pipeline definitions
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Inspect runs
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Remove the chief home directory
    Uninstall {
        /// Confirm removal
        #[arg(long)]
        yes: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Setup {
            username,
            new_password,
        } => setup::setup(username, new_password),
        Commands::Access { command } => access::handle_access_command(command, config),
        Commands::Start { detach } => daemon::start(detach).await,
        Commands::Status { id: None } => daemon::status(config).await,
        Commands::Status { id: Some(id) } => run::show_run(config, &id).await,
        Commands::Kill => daemon::kill(config).await,
        Commands::Pipeline { command } => {
            pipeline::handle_pipeline_command(command, config).await
        }
        Commands::Run { command } => run::handle_run_command(command, config).await,
        Commands::Uninstall { yes } => setup::uninstall(config, yes).await,
    }
}
