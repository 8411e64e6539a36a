//! First-run interactive collection of the credential record.
use crate::model::Credentials;
use anyhow::{Context, Result};
use std::io::{self, Write};

/// Prompt on stdin for the full credential record.
///
/// Called once, when the database has no credentials row yet. Secrets are
/// read without echo.
pub fn prompt_credentials() -> Result<Credentials> {
    Ok(Credentials {
        login_user: prompt("username")?,
        login_pass: prompt_secret("password")?,
        smtp_server: prompt("smtp server name")?,
        smtp_port: parse_port(&prompt("smtp port (usually 587)")?)?,
        smtp_from: prompt("who should this email be from")?,
        smtp_to: prompt("who is this email to")?,
        smtp_user: prompt("smtp user name")?,
        smtp_password: prompt_secret("smtp password")?,
    })
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read input")?;
    Ok(line.trim().to_string())
}

fn prompt_secret(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label}: ")).context("failed to read secret input")
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse()
        .with_context(|| format!("'{raw}' is not a valid port number"))
}
