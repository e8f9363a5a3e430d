//! Interactive input

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Prints `label` and reads one line from stdin, without the line terminator
pub fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Prints `label` and reads a password from the terminal without echoing it
pub fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(label).context("Failed to read password")
}
