//! Daemon command handlers
//!
//! Starting, querying and stopping the chief daemon.

use anyhow::{Context, Result};
use chief_core::access::AccessConfig;
use chief_core::dto::server::{DaemonState, ServerStatus};
use chief_daemon::Daemon;
use colored::*;
use std::process::Stdio;

use crate::config::Config;

/// Run the daemon in the foreground, or relaunch it in the background
pub async fn start(detach: bool) -> Result<()> {
    let daemon_config = chief_daemon::Config::from_env()?;
    tracing::debug!("Daemon configuration: {:?}", daemon_config);

    // The access document must exist before anyone can submit
    AccessConfig::load(&daemon_config.access_config_path())?;

    if detach {
        let exe = std::env::current_exe().context("Failed to locate the chief executable")?;
        let child = std::process::Command::new(exe)
            .arg("start")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to start the daemon in the background")?;

        println!(
            "{}",
            format!(
                "✓ Chief daemon starting in the background (pid {}) on {}",
                child.id(),
                daemon_config.bind_addr
            )
            .green()
        );
        return Ok(());
    }

    Daemon::new(daemon_config).run().await
}

/// Print the daemon status
pub async fn status(config: &Config) -> Result<()> {
    let status = config.client().status().await?;
    print_status(&status);
    Ok(())
}

/// Ask the daemon to shut down
pub async fn kill(config: &Config) -> Result<()> {
    let client = config.authorized_client()?;

    match client.kill().await {
        Ok(status) => {
            println!(
                "{}",
                "✓ Chief daemon is stopping; in-flight runs will finish first".green()
            );
            if status.active_runs > 0 {
                println!("  Runs in progress: {}", status.active_runs);
            }
            Ok(())
        }
        Err(e) if e.is_connection_error() => {
            println!("{}", "Chief daemon is not running.".yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_status(status: &ServerStatus) {
    let state = match status.status {
        DaemonState::Running => status.status.to_string().green().bold(),
        DaemonState::Stopping => status.status.to_string().yellow().bold(),
        DaemonState::Stopped => status.status.to_string().red().bold(),
    };

    println!("{}", "─".repeat(50).dimmed());
    println!("| Chief Status: {}", state);
    println!("{}", "─".repeat(50).dimmed());

    if status.status != DaemonState::Stopped {
        println!("  Active runs: {}", status.active_runs);
        println!("  Total runs:  {}", status.total_runs);
    }
}
