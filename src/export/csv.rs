use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::borrow::Borrow;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::risk::CustomerRiskRecord;

/// Fixed download name for exported results
pub const EXPORT_FILE_NAME: &str = "early_risk_results.csv";

/// A record attribute that can appear in an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    CustomerId,
    RiskLevel,
    BehaviourRiskScore,
    PaymentStressScore,
    TotalRiskFlags,
    CreditLimit,
    UtilisationPct,
    AvgPaymentRatio,
    MinDuePaidFrequency,
    RecentSpendChangePct,
    CashWithdrawalPct,
    MerchantMixIndex,
    DpdBucketNextMonth,
    DelinquentFlag,
    DelinquentLabel,
    RiskReasons,
}

impl RecordField {
    /// Raw value of the field, `None` when the service did not send it
    pub fn value(self, record: &CustomerRiskRecord) -> Option<String> {
        let text = match self {
            RecordField::CustomerId => record.customer_id.clone(),
            RecordField::RiskLevel => record.risk_level.to_string(),
            RecordField::BehaviourRiskScore => record.behaviour_risk_score.to_string(),
            RecordField::PaymentStressScore => record.payment_stress_score.to_string(),
            RecordField::TotalRiskFlags => record.total_risk_flags.to_string(),
            RecordField::CreditLimit => record.credit_limit.to_string(),
            RecordField::UtilisationPct => record.utilisation_pct.to_string(),
            RecordField::AvgPaymentRatio => record.avg_payment_ratio.to_string(),
            RecordField::MinDuePaidFrequency => record.min_due_paid_frequency.to_string(),
            RecordField::RecentSpendChangePct => record.recent_spend_change_pct.to_string(),
            RecordField::CashWithdrawalPct => record.cash_withdrawal_pct.to_string(),
            RecordField::MerchantMixIndex => record.merchant_mix_index.to_string(),
            RecordField::DpdBucketNextMonth => return record.dpd_bucket_next_month.clone(),
            RecordField::DelinquentFlag => record.delinquency_flag().to_string(),
            RecordField::DelinquentLabel => return record.delinquent_next_month_label.clone(),
            RecordField::RiskReasons => return record.risk_reasons_text.clone(),
        };
        Some(text)
    }
}

/// Header label paired with the field it reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub header: &'static str,
    pub field: RecordField,
}

const fn column(header: &'static str, field: RecordField) -> CsvColumn {
    CsvColumn { header, field }
}

/// The results export, in output order
pub const EXPORT_COLUMNS: [CsvColumn; 16] = [
    column("Customer ID", RecordField::CustomerId),
    column("Risk Level", RecordField::RiskLevel),
    column("Behaviour Risk Score", RecordField::BehaviourRiskScore),
    column("Payment Stress Score", RecordField::PaymentStressScore),
    column("Total Risk Flags", RecordField::TotalRiskFlags),
    column("Credit Limit", RecordField::CreditLimit),
    column("Utilisation %", RecordField::UtilisationPct),
    column("Avg Payment Ratio", RecordField::AvgPaymentRatio),
    column("Min Due Paid Frequency", RecordField::MinDuePaidFrequency),
    column("Recent Spend Change %", RecordField::RecentSpendChangePct),
    column("Cash Withdrawal %", RecordField::CashWithdrawalPct),
    column("Merchant Mix Index", RecordField::MerchantMixIndex),
    column("DPD Bucket Next Month", RecordField::DpdBucketNextMonth),
    column("Delinquent Next Month Flag", RecordField::DelinquentFlag),
    column("Delinquent Next Month Label", RecordField::DelinquentLabel),
    column("Risk Reasons", RecordField::RiskReasons),
];

/// Double every quote and wrap the value in quotes, whatever it contains.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Serialize records to CSV text.
///
/// The header row is left unquoted. Every data cell is quoted, missing values
/// become `""`, and rows are joined with `\n` without a trailing newline.
pub fn to_csv<R: Borrow<CustomerRiskRecord>>(records: &[R], columns: &[CsvColumn]) -> String {
    let header = columns
        .iter()
        .map(|c| c.header)
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(header);
    for record in records {
        let record = record.borrow();
        let row = columns
            .iter()
            .map(|c| quote(c.field.value(record).as_deref().unwrap_or("")))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }
    lines.join("\n")
}

/// Write the export into `dir` under the fixed file name, returning its path.
pub fn write_csv<R: Borrow<CustomerRiskRecord>>(dir: &Path, records: &[R]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);

    let mut file = AtomicWriteFile::open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(to_csv(records, &EXPORT_COLUMNS).as_bytes())
        .context("Failed to write CSV")?;
    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;

    tracing::debug!(path = %path.display(), rows = records.len(), "exported results");
    Ok(path)
}
