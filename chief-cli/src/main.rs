//! Chief CLI
//!
//! Command-line interface for running and talking to the Chief daemon.

mod commands;
mod config;
mod id_resolver;
mod input;
mod types;

use anyhow::Result;
use chief_client::DEFAULT_DAEMON_URL;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chief")]
#[command(about = "A continuous integration/deployment server for hobbyists", long_about = None)]
struct Cli {
    /// Daemon URL
    #[arg(long, env = "CHIEF_DAEMON_URL", default_value = DEFAULT_DAEMON_URL, global = true)]
    daemon_url: String,

    /// Username for commands that need clearance
    #[arg(long, env = "CHIEF_USER", global = true)]
    user: Option<String>,

    /// Password for commands that need clearance
    #[arg(long, env = "CHIEF_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chief_daemon=info,tower_http=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config {
        daemon_url: cli.daemon_url,
        user: cli.user,
        password: cli.password,
    };

    handle_command(cli.command, &config).await
}
