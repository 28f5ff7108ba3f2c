use serde::Deserialize;

use crate::risk::{CustomerRiskRecord, RiskCountsSummary};

/// Body of a successful batch upload
#[derive(Debug, Clone, Deserialize)]
pub struct BatchScoreResponse {
    #[serde(default)]
    pub risk_counts: RiskCountsSummary,
    pub customers: Vec<CustomerRiskRecord>,
}

/// Body of a successful manual check
#[derive(Debug, Clone, Deserialize)]
pub struct ManualScoreResponse {
    pub customer: CustomerRiskRecord,
    #[serde(default)]
    pub risk_counts: RiskCountsSummary,
}
