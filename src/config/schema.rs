use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_APP_NAME: &str = "Early Risk Signal System";

/// Top-level configuration.
///
/// Every section is optional; a missing section takes its defaults.
///
/// Example YAML:
/// ```yaml
/// api:
///   base_url: "http://localhost:5000"
///   timeout_secs: 60
/// report:
///   prepared_by: "Credit Risk Team"
/// currency:
///   symbol: "₹"
///   report_symbol: "Rs."
///   locale: "en-IN"
/// session:
///   max_age: "12h"
///   clear_on_logout: false
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Scoring service connection settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Text printed in the report header and metadata line
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_app_name")]
    pub title: String,

    #[serde(default = "default_subtitle")]
    pub subtitle: String,

    #[serde(default = "default_app_name")]
    pub prepared_by: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_app_name(),
            subtitle: default_subtitle(),
            prepared_by: default_app_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory receiving CSV exports and PDF reports (default: current directory)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CurrencyConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Symbol used in PDF reports, whose built-in font lacks most currency glyphs
    #[serde(default = "default_report_symbol")]
    pub report_symbol: String,

    /// BCP 47 locale driving digit grouping, e.g. "en-IN" (1,00,000) or "en-US" (100,000)
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            report_symbol: default_report_symbol(),
            locale: default_locale(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Maximum age of a stored session, e.g. "12h" or "2days".
    /// Unset means a session lives until it is replaced or cleared.
    #[serde(default)]
    pub max_age: Option<String>,

    /// Also clear the stored session on logout
    #[serde(default)]
    pub clear_on_logout: bool,
}

impl SessionConfig {
    /// Parsed `max_age`; invalid values are reported by config validation
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
            .as_deref()
            .and_then(|s| humantime::parse_duration(s).ok())
    }
}

/// Credentials accepted by `login`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            password: default_password(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_subtitle() -> String {
    "Customer Risk Report".to_string()
}

fn default_symbol() -> String {
    "₹".to_string()
}

fn default_report_symbol() -> String {
    "Rs.".to_string()
}

fn default_locale() -> String {
    "en-IN".to_string()
}

fn default_user_id() -> String {
    "analyst".to_string()
}

fn default_password() -> String {
    "risk123".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parse() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.currency.locale, "en-IN");
    }

    #[test]
    fn test_partial_config_parse() {
        let yaml = r#"
api:
  base_url: "https://risk.internal:8443"
session:
  max_age: "12h"
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://risk.internal:8443");
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.session.max_age(), Some(Duration::from_secs(12 * 3600)));
        assert!(!config.session.clear_on_logout);
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
api:
  base_url: "http://scoring:5000"
  timeout_secs: 15
report:
  title: "Acme Bank"
  subtitle: "Early Warning Report"
  prepared_by: "Collections Desk"
export:
  output_dir: "/tmp/exports"
currency:
  symbol: "$"
  report_symbol: "$"
  locale: "en-US"
session:
  clear_on_logout: true
auth:
  user_id: "ops"
  password: "secret"
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.api.timeout(), Duration::from_secs(15));
        assert_eq!(config.report.prepared_by, "Collections Desk");
        assert_eq!(config.export.output_dir, Some(PathBuf::from("/tmp/exports")));
        assert_eq!(config.currency.locale, "en-US");
        assert!(config.session.clear_on_logout);
        assert_eq!(config.auth.user_id, "ops");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "api:\n  base_uri: \"http://x\"\n";
        assert!(serde_saphyr::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
