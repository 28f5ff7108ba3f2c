use crate::output::NO_REASONS_PLACEHOLDER;
use crate::risk::CustomerRiskRecord;

/// A prepared e-mail the analyst finishes in their own mail client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutreachDraft {
    pub subject: String,
    pub body: String,
}

fn identity_lines(record: &CustomerRiskRecord) -> [String; 4] {
    [
        format!("Customer ID: {}", record.customer_id),
        format!("Risk Level: {}", record.risk_level),
        format!("Behaviour Risk Score: {}", record.behaviour_risk_score),
        format!("Payment Stress Score: {}", record.payment_stress_score),
    ]
}

impl OutreachDraft {
    /// Ask the risk team to review this customer
    pub fn schedule_review(record: &CustomerRiskRecord, app_name: &str) -> Self {
        let reasons = record
            .risk_reasons_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(NO_REASONS_PLACEHOLDER);

        let mut lines = vec![
            "Please schedule a risk review for the following customer:".to_string(),
            String::new(),
        ];
        lines.extend(identity_lines(record));
        lines.extend([
            String::new(),
            "Key Risk Reasons:".to_string(),
            reasons.to_string(),
            String::new(),
            format!("Generated via {}.", app_name),
        ]);

        Self {
            subject: format!("Schedule risk review – Customer {}", record.customer_id),
            body: lines.join("\n"),
        }
    }

    /// Ask relationship staff for a supportive early-intervention call
    pub fn contact_customer(record: &CustomerRiskRecord, app_name: &str) -> Self {
        let mut lines = vec![
            "Please reach out to the following customer regarding their credit card usage:"
                .to_string(),
            String::new(),
        ];
        lines.extend(identity_lines(record));
        lines.extend([
            String::new(),
            "Suggested tone: supportive, early-intervention call (not hard collections)."
                .to_string(),
            String::new(),
            format!("Generated via {}.", app_name),
        ]);

        Self {
            subject: format!("Customer outreach – {}", record.customer_id),
            body: lines.join("\n"),
        }
    }

    /// `mailto:` link with no recipient and percent-encoded subject and body
    pub fn mailto(&self) -> String {
        format!(
            "mailto:?subject={}&body={}",
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}
