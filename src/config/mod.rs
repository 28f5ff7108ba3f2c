pub mod init;
mod schema;

pub use schema::{
    ApiConfig, AuthConfig, Config, CurrencyConfig, ExportConfig, ReportConfig,
    SessionConfig, DEFAULT_API_BASE_URL,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the scoring service base URL
pub const ENV_API_URL_VAR: &str = "RISK_DESK_API_URL";

/// Environment variable overriding the config/state directory
pub const ENV_HOME_VAR: &str = "RISK_DESK_HOME";

/// Get the config directory path (~/.config/risk-desk/, or $RISK_DESK_HOME)
pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = non_empty_env(ENV_HOME_VAR) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".config").join("risk-desk"))
        .unwrap_or_else(|| PathBuf::from(".risk-desk"))
}

/// Get the default config file path (~/.config/risk-desk/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<()> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory at {}", config_dir.display())
        })?;
    }
    Ok(())
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path,
///   and a missing default file yields the built-in defaults.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!("Failed to parse config: invalid YAML in {}", config_path.display())
    })?;

    Ok(config)
}

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Err(e) = reqwest::Url::parse(&config.api.base_url) {
        errors.push(format!(
            "api.base_url: invalid URL '{}' - {}",
            config.api.base_url, e
        ));
    }

    if config.api.timeout_secs == 0 {
        errors.push("api.timeout_secs: must be greater than 0".to_string());
    }

    if let Some(ref max_age) = config.session.max_age {
        if let Err(e) = humantime::parse_duration(max_age) {
            errors.push(format!(
                "session.max_age: invalid duration '{}' - {}",
                max_age, e
            ));
        }
    }

    if let Err(e) = crate::output::decimal_formatter(&config.currency.locale) {
        errors.push(format!("currency.locale: {:#}", e));
    }

    if config.auth.user_id.trim().is_empty() {
        errors.push("auth.user_id: must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Scoring service base URL: $RISK_DESK_API_URL wins over the config file.
pub fn resolve_api_base_url(config: &Config) -> String {
    non_empty_env(ENV_API_URL_VAR).unwrap_or_else(|| config.api.base_url.clone())
}

/// Directory receiving exports and reports
pub fn resolve_output_dir(config: &Config, flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| config.export.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn non_empty_env(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string(); // Error 1
        config.api.timeout_secs = 0; // Error 2
        config.session.max_age = Some("soon".to_string()); // Error 3

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("api.base_url"));
        assert!(errors[2].contains("session.max_age"));
    }

    #[test]
    fn test_rejects_unparseable_locale() {
        let mut config = Config::default();
        config.currency.locale = "not a locale!".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("currency.locale:"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(dir.path().join("nope.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "report:\n  prepared_by: \"Risk Ops\"\n").unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.report.prepared_by, "Risk Ops");
        assert_eq!(config.report.subtitle, "Customer Risk Report");
    }

    #[test]
    fn test_resolve_output_dir_prefers_flag() {
        let mut config = Config::default();
        config.export.output_dir = Some(PathBuf::from("/srv/exports"));
        assert_eq!(
            resolve_output_dir(&config, Some(PathBuf::from("out"))),
            PathBuf::from("out")
        );
        assert_eq!(resolve_output_dir(&config, None), PathBuf::from("/srv/exports"));
        assert_eq!(
            resolve_output_dir(&Config::default(), None),
            PathBuf::from(".")
        );
    }
}
