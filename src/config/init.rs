use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, validate_config, Config};
use crate::output::parse_locale;

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

fn check_locale(input: &str) -> Result<String, String> {
    let tag = input.trim();
    parse_locale(tag)
        .map(|_| tag.to_string())
        .map_err(|e| format!("{:#}", e))
}

/// Run the interactive init wizard to create a config file.
///
/// If `path` is Some, writes there; otherwise to the default config path.
/// Returns the path written.
pub fn run_init_wizard(path: Option<PathBuf>) -> Result<PathBuf> {
    let config_path = path.unwrap_or_else(get_config_path);

    println!();
    println!("Risk Desk Configuration");
    println!("=======================");
    println!();

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!("Config already exists at {}. Overwrite?", config_path.display()),
            false,
        )?;
        if !overwrite {
            anyhow::bail!("Aborted: existing config left unchanged");
        }
    }

    let mut config = Config::default();

    println!("The scoring service receives uploads and manual checks.");
    config.api.base_url = loop {
        let input = prompt_with_default("Scoring service URL", &config.api.base_url)?;
        match reqwest::Url::parse(&input) {
            Ok(_) => break input,
            Err(e) => println!("  Invalid URL: {}. Try again.", e),
        }
    };

    println!();
    config.report.prepared_by =
        prompt_with_default("Report 'Prepared by' line", &config.report.prepared_by)?;

    println!();
    config.currency.symbol = prompt_with_default("Currency symbol", &config.currency.symbol)?;
    config.currency.report_symbol = prompt_with_default(
        "Currency symbol in PDF reports (plain ASCII works best)",
        &config.currency.report_symbol,
    )?;
    config.currency.locale = loop {
        let input = prompt_with_default(
            "Number locale (en-IN groups 1,00,000; en-US groups 100,000)",
            &config.currency.locale,
        )?;
        match check_locale(&input) {
            Ok(tag) => break tag,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    println!();
    println!("Stored results normally live until the next upload replaces them.");
    config.session.max_age = loop {
        let input = prompt("Expire stored results after (e.g. '12h', empty = never): ")?;
        if input.is_empty() {
            break None;
        }
        match humantime::parse_duration(&input) {
            Ok(_) => break Some(input),
            Err(e) => println!("  Invalid duration: {}. Try again.", e),
        }
    };
    config.session.clear_on_logout = prompt_yes_no("Clear stored results on logout?", false)?;

    if let Err(errors) = validate_config(&config) {
        anyhow::bail!("Generated config is invalid: {}", errors.join("; "));
    }

    write_config(&config_path, &config)?;
    println!();
    println!("Config written to {}", config_path.display());
    Ok(config_path)
}

/// Serialize a config as YAML to `path`, creating parent directories.
pub fn write_config(path: &std::path::Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let yaml = serde_saphyr::to_string(config).context("Failed to serialize config")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn test_check_locale() {
        assert_eq!(check_locale(" en-IN "), Ok("en-IN".to_string()));
        assert_eq!(check_locale("en-US"), Ok("en-US".to_string()));
        assert!(check_locale("not a locale!").is_err());
    }

    #[test]
    fn test_write_config_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.report.prepared_by = "Collections".to_string();
        config.session.max_age = Some("1day".to_string());
        write_config(&path, &config).unwrap();

        let loaded = load_config(Some(path)).unwrap();
        assert_eq!(loaded, config);
    }
}
