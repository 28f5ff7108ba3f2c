use chrono::Duration;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use super::number::{format_trimmed, CurrencyFormat};
use crate::risk::{CustomerRiskRecord, RiskCountsSummary, RiskLevel};

pub const EMPTY_RESULTS_TITLE: &str = "No results available";
pub const EMPTY_RESULTS_HINT: &str =
    "Please upload a customer data file with `risk-desk score <FILE>` to run the risk engine.";
pub const NO_REASONS_PLACEHOLDER: &str = "No specific risk reasons recorded for this customer.";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
pub fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Hint shown under each summary card
pub fn level_hint(level: &RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "Requires immediate attention",
        RiskLevel::Medium => "Monitor closely",
        _ => "Performing well",
    }
}

fn paint_level(text: &str, level: &RiskLevel) -> String {
    match level {
        RiskLevel::High => text.red().bold().to_string(),
        RiskLevel::Medium => text.yellow().to_string(),
        RiskLevel::Low => text.green().to_string(),
        RiskLevel::Unrecognized(_) => text.dimmed().to_string(),
    }
}

/// Shown instead of results when nothing has been scored yet
pub fn format_empty_results(use_colors: bool) -> String {
    if use_colors {
        format!("{}\n{}", EMPTY_RESULTS_TITLE.bold(), EMPTY_RESULTS_HINT.dimmed())
    } else {
        format!("{}\n{}", EMPTY_RESULTS_TITLE, EMPTY_RESULTS_HINT)
    }
}

/// One line per risk level: label, count, hint
pub fn format_summary(counts: &RiskCountsSummary, use_colors: bool) -> String {
    RiskLevel::KNOWN
        .iter()
        .map(|level| {
            let label = format!("{:<12}", format!("{} Risk", level));
            let count = format!("{:>6}", counts.count(level));
            let hint = level_hint(level);
            if use_colors {
                format!("{}{}  {}", paint_level(&label, level), count.bold(), hint.dimmed())
            } else {
                format!("{}{}  {}", label, count, hint)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Results table: index, id, level, behaviour score, delinquent, credit limit, flags
pub fn format_results_table(
    records: &[&CustomerRiskRecord],
    currency: &CurrencyFormat,
    use_colors: bool,
) -> String {
    if records.is_empty() {
        return "No customers match the current filters.".to_string();
    }

    let id_width = records
        .iter()
        .map(|r| r.customer_id.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(11, 24);

    let header = format!(
        "{:>4} {:<id_width$}  {:<8}  {:>9}  {:<10}  {:>14}  {:>5}",
        "#",
        "Customer ID",
        "Risk",
        "Behaviour",
        "Delinquent",
        "Credit Limit",
        "Flags",
        id_width = id_width
    );

    let rows = records.iter().enumerate().map(|(idx, record)| {
        let index = format!("{:>3}.", idx + 1);
        let id = format!("{:<id_width$}", truncate(&record.customer_id, id_width), id_width = id_width);
        let level = format!("{:<8}", truncate(record.risk_level.as_str(), 8));
        let score = format!("{:>9.1}", record.behaviour_risk_score);
        let delinquent = format!("{:<10}", yes_no(record.delinquent_next_month));
        let limit = format!("{:>14}", currency.format(record.credit_limit));
        let flags = format!("{:>5}", record.total_risk_flags);

        if use_colors {
            format!(
                "{} {}  {}  {}  {}  {}  {}",
                index.dimmed(),
                id,
                paint_level(&level, &record.risk_level),
                score.bold(),
                if record.delinquent_next_month {
                    delinquent.red().to_string()
                } else {
                    delinquent
                },
                limit,
                flags
            )
        } else {
            format!(
                "{} {}  {}  {}  {}  {}  {}",
                index, id, level, score, delinquent, limit, flags
            )
        }
    });

    let header = if use_colors {
        header.bold().to_string()
    } else {
        header
    };
    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tab-separated rows for scripting (no headers, no colors)
/// Columns: id, risk level, behaviour score, payment stress score, delinquent flag,
/// credit limit, total flags
pub fn format_tsv(records: &[&CustomerRiskRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.customer_id,
                r.risk_level,
                r.behaviour_risk_score,
                r.payment_stress_score,
                r.delinquency_flag(),
                r.credit_limit,
                r.total_risk_flags
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-line detail view of a single record
pub fn format_customer_detail(
    record: &CustomerRiskRecord,
    currency: &CurrencyFormat,
    use_colors: bool,
    width: Option<usize>,
) -> String {
    let title = format!("Customer {}", record.customer_id);
    let badge = format!("{} Risk", record.risk_level);
    let mut lines = Vec::new();

    if use_colors {
        lines.push(format!("{}  {}", title.bold(), paint_level(&badge, &record.risk_level)));
    } else {
        lines.push(format!("{}  [{}]", title, badge));
    }

    let pct = |v: f64| format!("{}%", format_trimmed(v, 2));
    let section = |name: &str| {
        if use_colors {
            format!("\n{}", name.underline())
        } else {
            format!("\n{}", name)
        }
    };

    lines.push(section("Overview"));
    lines.push(format!(
        "  Behaviour Risk Score:   {:.1} ({})",
        record.behaviour_risk_score, record.behaviour_risk_category
    ));
    lines.push(format!(
        "  Payment Stress Score:   {:.1} ({})",
        record.payment_stress_score, record.payment_stress_category
    ));
    lines.push(format!("  Total Risk Flags:       {}", record.total_risk_flags));
    lines.push(format!(
        "  Next Month DPD Bucket:  {}",
        record.dpd_bucket_next_month.as_deref().unwrap_or("-")
    ));
    lines.push(format!("  Delinquency Forecast:   {}", record.delinquency_label()));

    lines.push(section("Behaviour & Usage Metrics"));
    lines.push(format!("  Credit Limit:           {}", currency.format(record.credit_limit)));
    lines.push(format!("  Utilisation:            {}", pct(record.utilisation_pct)));
    lines.push(format!("  Avg Payment Ratio:      {}", pct(record.avg_payment_ratio)));
    lines.push(format!("  Min Due Paid Frequency: {}", pct(record.min_due_paid_frequency)));
    lines.push(format!("  Recent Spend Change:    {}", pct(record.recent_spend_change_pct)));
    lines.push(format!("  Cash Withdrawal:        {}", pct(record.cash_withdrawal_pct)));
    lines.push(format!(
        "  Merchant Mix Index:     {}",
        format_trimmed(record.merchant_mix_index, 2)
    ));

    lines.push(section("Risk Assessment Summary"));
    let narrative = record
        .risk_reasons_text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(NO_REASONS_PLACEHOLDER);
    let wrap_width = width.unwrap_or(80).clamp(40, 100) - 2;
    let options = textwrap::Options::new(wrap_width)
        .initial_indent("  ")
        .subsequent_indent("  ");
    lines.extend(textwrap::wrap(narrative, options).into_iter().map(|l| l.into_owned()));

    lines.join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}
