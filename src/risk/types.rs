use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Format version written into every persisted session.
pub const SESSION_FORMAT_VERSION: u32 = 1;

/// Three-way risk label used for the overall level and both score categories.
///
/// Labels outside the three known values are kept verbatim so a record is
/// never dropped, but they never match a specific filter and are left out of
/// the aggregated counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl RiskLevel {
    /// The recognized labels, in display order.
    pub const KNOWN: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low];

    pub fn parse(label: &str) -> Self {
        match label {
            "High" => RiskLevel::High,
            "Medium" => RiskLevel::Medium,
            "Low" => RiskLevel::Low,
            other => RiskLevel::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Unrecognized(label) => label,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, RiskLevel::Unrecognized(_))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RiskLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(RiskLevel::parse(&label))
    }
}

/// One scored account as returned by the scoring service.
///
/// Field names on the wire are the service's column names, which mix
/// spaced headers ("Credit Limit") with underscored ones ("Risk_Level").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRiskRecord {
    #[serde(rename = "Customer ID", deserialize_with = "string_or_number")]
    pub customer_id: String,

    #[serde(rename = "Risk_Level")]
    pub risk_level: RiskLevel,

    #[serde(rename = "Behaviour_Risk_Score")]
    pub behaviour_risk_score: f64,

    #[serde(rename = "Behaviour_Risk_Category")]
    pub behaviour_risk_category: RiskLevel,

    #[serde(rename = "Payment_Stress_Score")]
    pub payment_stress_score: f64,

    #[serde(rename = "Payment_Stress_Category")]
    pub payment_stress_category: RiskLevel,

    #[serde(rename = "Total_Risk_Flags")]
    pub total_risk_flags: u32,

    #[serde(rename = "Risk_Reasons_Text", default, skip_serializing_if = "Option::is_none")]
    pub risk_reasons_text: Option<String>,

    #[serde(rename = "Delinquent_NextMonth_Flag", with = "delinquency_flag")]
    pub delinquent_next_month: bool,

    #[serde(
        rename = "Delinquent_NextMonth_Label",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub delinquent_next_month_label: Option<String>,

    #[serde(
        rename = "DPD Bucket Next Month",
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub dpd_bucket_next_month: Option<String>,

    #[serde(rename = "Credit Limit")]
    pub credit_limit: f64,

    #[serde(rename = "Utilisation %")]
    pub utilisation_pct: f64,

    #[serde(rename = "Avg Payment Ratio")]
    pub avg_payment_ratio: f64,

    #[serde(rename = "Min Due Paid Frequency")]
    pub min_due_paid_frequency: f64,

    #[serde(rename = "Recent Spend Change %")]
    pub recent_spend_change_pct: f64,

    #[serde(rename = "Cash Withdrawal %")]
    pub cash_withdrawal_pct: f64,

    #[serde(rename = "Merchant Mix Index")]
    pub merchant_mix_index: f64,
}

impl CustomerRiskRecord {
    /// The delinquency prediction as the service encodes it (0 or 1).
    pub fn delinquency_flag(&self) -> u8 {
        u8::from(self.delinquent_next_month)
    }

    /// Label for the delinquency prediction, derived from the flag when the
    /// service did not send one.
    pub fn delinquency_label(&self) -> &str {
        match &self.delinquent_next_month_label {
            Some(label) => label,
            None if self.delinquent_next_month => "Delinquent Next Month",
            None => "Not Delinquent Next Month",
        }
    }
}

/// Count of records per risk level. Absent keys count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCountsSummary {
    #[serde(rename = "High", default, skip_serializing_if = "Option::is_none")]
    pub high: Option<u64>,

    #[serde(rename = "Medium", default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<u64>,

    #[serde(rename = "Low", default, skip_serializing_if = "Option::is_none")]
    pub low: Option<u64>,
}

impl RiskCountsSummary {
    pub fn count(&self, level: &RiskLevel) -> u64 {
        let slot = match level {
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
            RiskLevel::Unrecognized(_) => None,
        };
        slot.unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        RiskLevel::KNOWN.iter().map(|level| self.count(level)).sum()
    }
}

/// Where the live session came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionSource {
    Batch { file_name: String },
    Manual,
}

impl fmt::Display for SessionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionSource::Batch { file_name } => write!(f, "batch upload ({})", file_name),
            SessionSource::Manual => f.write_str("manual check"),
        }
    }
}

/// The single live scoring result handed between screens.
///
/// `customers` keeps the service's response order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSession {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub source: SessionSource,
    #[serde(default)]
    pub customers: Vec<CustomerRiskRecord>,
    #[serde(default)]
    pub risk_counts: RiskCountsSummary,
}

impl ScoringSession {
    pub fn new(
        source: SessionSource,
        customers: Vec<CustomerRiskRecord>,
        risk_counts: RiskCountsSummary,
    ) -> Self {
        Self {
            version: SESSION_FORMAT_VERSION,
            created_at: Utc::now(),
            source,
            customers,
            risk_counts,
        }
    }

    /// Look up a record by customer id.
    pub fn find(&self, customer_id: &str) -> Option<&CustomerRiskRecord> {
        self.customers.iter().find(|c| c.customer_id == customer_id)
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// How long ago the session was created
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }
}

/// Hypothetical account profile entered for a one-off manual check.
///
/// Serializes with the snake_case keys the manual scoring endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualInputProfile {
    pub credit_limit: f64,
    pub utilisation_pct: f64,
    pub avg_payment_ratio: f64,
    pub min_due_paid_frequency: f64,
    pub merchant_mix_index: f64,
    pub cash_withdrawal_pct: f64,
    pub recent_spend_change_pct: f64,
}

impl Default for ManualInputProfile {
    fn default() -> Self {
        Self {
            credit_limit: 100_000.0,
            utilisation_pct: 50.0,
            avg_payment_ratio: 60.0,
            min_due_paid_frequency: 40.0,
            merchant_mix_index: 0.6,
            cash_withdrawal_pct: 10.0,
            recent_spend_change_pct: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Int(n) => n.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(StringOrNumber::into_string))
}

/// The delinquency flag travels as 0/1; booleans are accepted on input.
mod delinquency_flag {
    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match RawFlag::deserialize(deserializer)? {
            RawFlag::Int(0) => Ok(false),
            RawFlag::Int(1) => Ok(true),
            RawFlag::Float(f) if f == 0.0 => Ok(false),
            RawFlag::Float(f) if f == 1.0 => Ok(true),
            RawFlag::Bool(b) => Ok(b),
            other => Err(de::Error::custom(format!(
                "delinquency flag must be 0 or 1, got {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_row() -> serde_json::Value {
        json!({
            "Customer ID": "C001",
            "Risk_Level": "High",
            "Behaviour_Risk_Score": 61.5,
            "Behaviour_Risk_Category": "High",
            "Payment_Stress_Score": 42.0,
            "Payment_Stress_Category": "High",
            "Total_Risk_Flags": 4,
            "Risk_Reasons_Text": "Low Payment Ratio, Recent Spend Drop",
            "Delinquent_NextMonth_Flag": 1,
            "Delinquent_NextMonth_Label": "Delinquent Next Month",
            "DPD Bucket Next Month": 2,
            "Credit Limit": 150000,
            "Utilisation %": 88,
            "Avg Payment Ratio": 30,
            "Min Due Paid Frequency": 70,
            "Recent Spend Change %": -25,
            "Cash Withdrawal %": 22,
            "Merchant Mix Index": 0.8,
            "F1_PaymentLow": 1
        })
    }

    #[test]
    fn test_parse_service_row() {
        let record: CustomerRiskRecord = serde_json::from_value(service_row()).unwrap();
        assert_eq!(record.customer_id, "C001");
        assert_eq!(record.risk_level, RiskLevel::High);
        assert_eq!(record.total_risk_flags, 4);
        assert!(record.delinquent_next_month);
        assert_eq!(record.dpd_bucket_next_month.as_deref(), Some("2"));
        assert_eq!(record.credit_limit, 150000.0);
    }

    #[test]
    fn test_numeric_customer_id_becomes_string() {
        let mut row = service_row();
        row["Customer ID"] = json!(10234);
        let record: CustomerRiskRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.customer_id, "10234");
    }

    #[test]
    fn test_optional_fields_may_be_missing() {
        let mut row = service_row();
        let obj = row.as_object_mut().unwrap();
        obj.remove("Risk_Reasons_Text");
        obj.remove("DPD Bucket Next Month");
        obj.remove("Delinquent_NextMonth_Label");
        obj.insert("Delinquent_NextMonth_Flag".to_string(), json!(0));

        let record: CustomerRiskRecord = serde_json::from_value(row).unwrap();
        assert!(record.risk_reasons_text.is_none());
        assert!(record.dpd_bucket_next_month.is_none());
        assert_eq!(record.delinquency_label(), "Not Delinquent Next Month");
    }

    #[test]
    fn test_delinquency_flag_rejects_other_values() {
        let mut row = service_row();
        row["Delinquent_NextMonth_Flag"] = json!(2);
        assert!(serde_json::from_value::<CustomerRiskRecord>(row).is_err());
    }

    #[test]
    fn test_delinquency_flag_serializes_as_integer() {
        let record: CustomerRiskRecord = serde_json::from_value(service_row()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["Delinquent_NextMonth_Flag"], json!(1));
        assert_eq!(record.delinquency_flag(), 1);
    }

    #[test]
    fn test_unrecognized_risk_level_is_preserved() {
        let mut row = service_row();
        row["Risk_Level"] = json!("Critical");
        let record: CustomerRiskRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.risk_level, RiskLevel::Unrecognized("Critical".to_string()));
        assert!(!record.risk_level.is_recognized());
        assert_eq!(record.risk_level.to_string(), "Critical");
    }

    #[test]
    fn test_risk_counts_absent_keys_are_zero() {
        let counts: RiskCountsSummary = serde_json::from_value(json!({"High": 3, "Low": 1})).unwrap();
        assert_eq!(counts.count(&RiskLevel::High), 3);
        assert_eq!(counts.count(&RiskLevel::Medium), 0);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_manual_profile_uses_snake_case_keys() {
        let value = serde_json::to_value(ManualInputProfile::default()).unwrap();
        assert_eq!(value["credit_limit"], json!(100000.0));
        assert_eq!(value["merchant_mix_index"], json!(0.6));
        assert_eq!(value.as_object().unwrap().len(), 7);
    }

    #[test]
    fn test_session_find() {
        let record: CustomerRiskRecord = serde_json::from_value(service_row()).unwrap();
        let session = ScoringSession::new(
            SessionSource::Manual,
            vec![record],
            RiskCountsSummary::default(),
        );
        assert!(session.find("C001").is_some());
        assert!(session.find("C999").is_none());
        assert_eq!(session.version, SESSION_FORMAT_VERSION);
    }
}
