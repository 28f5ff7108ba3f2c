use anyhow::{Context, Result};
use icu_decimal::input::Decimal;
use icu_decimal::options::DecimalFormatterOptions;
use icu_decimal::{DecimalFormatter, DecimalFormatterPreferences};
use icu_locale_core::{locale, Locale};

use crate::config::CurrencyConfig;

/// Parse a BCP 47 tag such as "en-IN" or "en-US"
pub fn parse_locale(tag: &str) -> Result<Locale> {
    tag.parse::<Locale>()
        .with_context(|| format!("invalid locale '{}'", tag))
}

/// Build a locale-aware digit formatter for `tag`.
pub fn decimal_formatter(tag: &str) -> Result<DecimalFormatter> {
    let locale = parse_locale(tag)?;
    DecimalFormatter::try_new(
        DecimalFormatterPreferences::from(&locale),
        DecimalFormatterOptions::default(),
    )
    .with_context(|| format!("no number data for locale '{}'", tag))
}

/// Format with at most `max_fraction` decimals, trailing zeros dropped,
/// and integer digits grouped the way `formatter`'s locale writes them.
/// Non-finite values render as "-".
pub fn format_amount(value: f64, max_fraction: usize, formatter: &DecimalFormatter) -> String {
    let magnitude = format_trimmed(value.abs(), max_fraction);
    if magnitude == "-" {
        return magnitude;
    }

    let grouped = match Decimal::try_from_str(&magnitude) {
        Ok(decimal) => formatter.format(&decimal).to_string(),
        Err(_) => magnitude.clone(),
    };

    if value.is_sign_negative() && magnitude != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Fixed decimals with trailing zeros trimmed (48.25, 21, 0.6)
pub fn format_trimmed(value: f64, max_fraction: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let fixed = format!("{:.*}", max_fraction, value);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// How money is written in one output medium
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub locale: Locale,
    pub max_fraction: usize,
}

impl CurrencyFormat {
    /// Whole units with the configured symbol, for the terminal
    pub fn terminal(config: &CurrencyConfig) -> Self {
        Self::whole_units(config.symbol.clone(), &config.locale)
    }

    /// Report variant: whole units behind the ASCII-safe symbol
    pub fn report(config: &CurrencyConfig) -> Self {
        Self::whole_units(config.report_symbol.clone(), &config.locale)
    }

    fn whole_units(symbol: String, tag: &str) -> Self {
        let locale = match parse_locale(tag) {
            Ok(locale) => locale,
            Err(e) => {
                tracing::warn!(locale = tag, error = %e, "falling back to en-IN");
                locale!("en-IN")
            }
        };
        Self {
            symbol,
            locale,
            max_fraction: 0,
        }
    }

    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return "-".to_string();
        }
        let amount = match DecimalFormatter::try_new(
            DecimalFormatterPreferences::from(&self.locale),
            DecimalFormatterOptions::default(),
        ) {
            Ok(formatter) => format_amount(value, self.max_fraction, &formatter),
            Err(_) => format_trimmed(value, self.max_fraction),
        };
        match amount.strip_prefix('-') {
            Some(magnitude) => format!("-{}{}", self.symbol, magnitude),
            None => format!("{}{}", self.symbol, amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency_config(locale: &str) -> CurrencyConfig {
        CurrencyConfig {
            locale: locale.to_string(),
            ..CurrencyConfig::default()
        }
    }

    #[test]
    fn test_indian_grouping() {
        let formatter = decimal_formatter("en-IN").unwrap();
        assert_eq!(format_amount(100000.0, 0, &formatter), "1,00,000");
        assert_eq!(format_amount(1234567.0, 0, &formatter), "12,34,567");
        assert_eq!(format_amount(12345.0, 0, &formatter), "12,345");
        assert_eq!(format_amount(999.0, 0, &formatter), "999");
    }

    #[test]
    fn test_us_grouping() {
        let formatter = decimal_formatter("en-US").unwrap();
        assert_eq!(format_amount(100000.0, 0, &formatter), "100,000");
        assert_eq!(format_amount(1234567.0, 0, &formatter), "1,234,567");
    }

    #[test]
    fn test_format_amount() {
        let indian = decimal_formatter("en-IN").unwrap();
        let us = decimal_formatter("en-US").unwrap();
        assert_eq!(format_amount(150000.0, 0, &indian), "1,50,000");
        assert_eq!(format_amount(1234.5678, 3, &indian), "1,234.568");
        assert_eq!(format_amount(2500.50, 3, &us), "2,500.5");
        assert_eq!(format_amount(-0.2, 0, &indian), "0");
        assert_eq!(format_amount(-1500.0, 0, &indian), "-1,500");
        assert_eq!(format_amount(f64::NAN, 0, &indian), "-");
    }

    #[test]
    fn test_rejects_bad_locale() {
        assert!(decimal_formatter("not a locale!").is_err());
        assert!(parse_locale("en-IN").is_ok());
    }

    #[test]
    fn test_terminal_currency() {
        let currency = CurrencyFormat::terminal(&CurrencyConfig::default());
        assert_eq!(currency.format(100000.0), "₹1,00,000");
        assert_eq!(currency.format(99999.6), "₹1,00,000");
        assert_eq!(currency.format(-2500.0), "-₹2,500");
        assert_eq!(currency.format(f64::INFINITY), "-");
    }

    #[test]
    fn test_terminal_currency_follows_locale() {
        let currency = CurrencyFormat::terminal(&currency_config("en-US"));
        assert_eq!(currency.format(100000.0), "₹100,000");
    }

    #[test]
    fn test_bad_locale_falls_back_to_indian_grouping() {
        let currency = CurrencyFormat::terminal(&currency_config("??"));
        assert_eq!(currency.format(100000.0), "₹1,00,000");
    }

    #[test]
    fn test_report_currency_is_whole_units() {
        let currency = CurrencyFormat::report(&CurrencyConfig::default());
        assert_eq!(currency.max_fraction, 0);
        assert_eq!(currency.format(150000.0), "Rs.1,50,000");
        assert_eq!(currency.format(1250.75), "Rs.1,251");
        assert_eq!(currency.format(1250.25), "Rs.1,250");
    }

    #[test]
    fn test_format_trimmed() {
        assert_eq!(format_trimmed(48.25, 2), "48.25");
        assert_eq!(format_trimmed(21.0, 2), "21");
        assert_eq!(format_trimmed(0.6, 2), "0.6");
        assert_eq!(format_trimmed(33.3333, 2), "33.33");
        assert_eq!(format_trimmed(-0.001, 2), "0");
    }
}
