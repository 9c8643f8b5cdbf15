//! Command handlers. Each takes the shared `App` and prints its result.

pub mod account;
pub mod dashboard;
pub mod notes;
pub mod tasks;
pub mod theme;

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::app::App;

/// Environment variable supplying the password non-interactively
const PASSWORD_ENV: &str = "TASKDESK_PASSWORD";

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim().to_string())
}

fn prompt_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

/// Email from the flag, else prompt (offering the last one used)
fn resolve_email(app: &App, email: Option<String>) -> Result<String> {
    if let Some(email) = email {
        return Ok(email);
    }
    match app.config.last_email {
        Some(ref last) => {
            let input = prompt_line(&format!("Email [{}]: ", last))?;
            Ok(if input.is_empty() { last.clone() } else { input })
        }
        None => prompt_line("Email: "),
    }
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N]: ", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
