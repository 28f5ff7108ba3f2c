pub mod aggregate;
pub mod filter;
pub mod types;
pub mod validation;

pub use aggregate::{aggregate, count_unrecognized};
pub use filter::{filter_records, DelinquencyFilter, RecordFilter, RiskFilter};
pub use types::{
    CustomerRiskRecord, ManualInputProfile, RiskCountsSummary, RiskLevel, ScoringSession,
    SessionSource, SESSION_FORMAT_VERSION,
};
pub use validation::validate_profile;

#[cfg(test)]
pub(crate) mod fixtures {
    use super::types::{CustomerRiskRecord, RiskLevel};

    /// A plausible scored record with the given identity, level and delinquency.
    pub fn record(id: &str, level: RiskLevel, delinquent: bool) -> CustomerRiskRecord {
        CustomerRiskRecord {
            customer_id: id.to_string(),
            behaviour_risk_category: level.clone(),
            payment_stress_category: level.clone(),
            risk_level: level,
            behaviour_risk_score: 48.25,
            payment_stress_score: 21.0,
            total_risk_flags: 2,
            risk_reasons_text: Some("Low Payment Ratio, Payment Stress".to_string()),
            delinquent_next_month: delinquent,
            delinquent_next_month_label: Some(
                if delinquent {
                    "Delinquent Next Month"
                } else {
                    "Not Delinquent Next Month"
                }
                .to_string(),
            ),
            dpd_bucket_next_month: Some(if delinquent { "1" } else { "0" }.to_string()),
            credit_limit: 150_000.0,
            utilisation_pct: 72.0,
            avg_payment_ratio: 45.0,
            min_due_paid_frequency: 60.0,
            recent_spend_change_pct: -10.0,
            cash_withdrawal_pct: 12.0,
            merchant_mix_index: 0.55,
        }
    }

    /// Six records: three High, two Medium, one Low, interleaved.
    pub fn six_record_cohort() -> Vec<CustomerRiskRecord> {
        vec![
            record("C001", RiskLevel::High, true),
            record("C002", RiskLevel::Medium, false),
            record("C003", RiskLevel::High, false),
            record("C004", RiskLevel::Low, false),
            record("C005", RiskLevel::Medium, true),
            record("C006", RiskLevel::High, true),
        ]
    }
}
