//! Setup and uninstall command handlers

use anyhow::{Context, Result};
use chief_core::access::{AccessConfig, ConfigError, chief_home};
use chief_core::domain::access::Clearance;
use chief_core::dto::server::DaemonState;
use colored::*;

use crate::config::Config;
use crate::input;

/// Create the chief home and config document, adding a master user if none exists
pub fn setup(username: Option<String>, password: Option<String>) -> Result<()> {
    let home = chief_home()?;
    std::fs::create_dir_all(&home)
        .with_context(|| format!("Failed to create {}", home.display()))?;

    let path = AccessConfig::path_in(&home);
    let mut access = match AccessConfig::load(&path) {
        Ok(access) => access,
        Err(ConfigError::NotFound { .. }) => AccessConfig::default(),
        Err(e) => return Err(e.into()),
    };

    if access.has_master() {
        println!(
            "{}",
            format!("✓ Chief is already set up in {}", home.display()).green()
        );
        return Ok(());
    }

    println!("{}", "Create the master user for this chief server.".bold());
    let username = match username {
        Some(username) => username,
        None => input::prompt("Enter username: ")?,
    };
    let password = match password {
        Some(password) => password,
        None => input::prompt_password("Enter new user's password: ")?,
    };

    access.add_user(&username, &password, Clearance::Master)?;
    access.save(&path)?;

    println!(
        "{}",
        format!("✓ Chief set up in {}", home.display()).green().bold()
    );
    println!("  Master user: {}", username.trim().cyan());
    println!("  Start the daemon with {}", "chief start".cyan());

    Ok(())
}

/// Remove the chief home directory
pub async fn uninstall(config: &Config, yes: bool) -> Result<()> {
    let home = chief_home()?;

    if !yes {
        println!(
            "{}",
            format!(
                "This removes {} including users and kept workspaces.",
                home.display()
            )
            .yellow()
        );
        println!("Re-run with {} to proceed.", "--yes".cyan());
        return Ok(());
    }

    let status = config.client().status().await?;
    if status.status != DaemonState::Stopped {
        anyhow::bail!("the chief daemon is still running, stop it with 'chief kill' first");
    }

    if !home.exists() {
        println!("{}", "Chief is not installed.".yellow());
        return Ok(());
    }

    std::fs::remove_dir_all(&home)
        .with_context(|| format!("Failed to remove {}", home.display()))?;

    println!("{}", format!("✓ Removed {}", home.display()).green());
    Ok(())
}
