//! Access command handlers
//!
//! Manages the users in the local access configuration. Every subcommand
//! requires master credentials.

use anyhow::Result;
use chief_core::domain::access::Clearance;
use clap::Subcommand;
use colored::*;

use crate::config::Config;
use crate::input;

/// Access subcommands
#[derive(Subcommand)]
pub enum AccessCommands {
    /// Add a new user
    Add {
        /// Username of the new user
        username: String,

        /// Grant master clearance instead of normal
        #[arg(long)]
        master: bool,

        /// Password of the new user (prompted if omitted)
        #[arg(long, env = "CHIEF_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
    /// Remove an existing user
    Remove {
        /// Username to remove
        username: String,
    },
    /// List all users and clearances
    List,
}

/// Handle access commands
pub fn handle_access_command(command: AccessCommands, config: &Config) -> Result<()> {
    let (mut access, path) = config.login(Clearance::Master)?;

    match command {
        AccessCommands::Add {
            username,
            master,
            new_password,
        } => {
            let clearance = if master {
                Clearance::Master
            } else {
                Clearance::Normal
            };
            let password = match new_password {
                Some(password) => password,
                None => input::prompt_password("Enter new user's password: ")?,
            };

            access.add_user(&username, &password, clearance)?;
            access.save(&path)?;

            println!(
                "{}",
                format!("✓ Added user '{}' ({} clearance)", username.trim(), clearance).green()
            );
        }
        AccessCommands::Remove { username } => {
            access.remove_user(&username)?;
            access.save(&path)?;

            println!("{}", format!("✓ Removed user '{}'", username).green());
        }
        AccessCommands::List => {
            println!("{}", format!("{} user(s):", access.access.len()).bold());
            for (username, user) in &access.access {
                let clearance = match user.clearance {
                    Clearance::Master => user.clearance.to_string().magenta(),
                    Clearance::Normal => user.clearance.to_string().normal(),
                };
                println!("  {} {}: {}", "▸".cyan(), username, clearance);
            }
        }
    }

    Ok(())
}
