use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Ask for a user id on stdin and a password without echo
pub fn prompt_for_credentials() -> Result<(String, String)> {
    print!("User ID: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut user_id = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut user_id)
        .context("Failed to read user id from stdin")?;
    let user_id = user_id.trim().to_string();

    if user_id.is_empty() {
        anyhow::bail!("User ID cannot be empty");
    }

    let password = rpassword::prompt_password("Password: ")
        .context("Failed to read password from stdin")?;

    Ok((user_id, password))
}
