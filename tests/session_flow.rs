use risk_desk::export::{to_csv, EXPORT_COLUMNS};
use risk_desk::risk::{
    aggregate, CustomerRiskRecord, RecordFilter, RiskFilter, RiskLevel, ScoringSession,
    SessionSource,
};
use risk_desk::session::{FileSessionStore, SessionStore};

fn customer(id: &str, level: &str, delinquent: u8) -> serde_json::Value {
    serde_json::json!({
        "Customer ID": id,
        "Risk_Level": level,
        "Behaviour_Risk_Score": 61.5,
        "Behaviour_Risk_Category": level,
        "Payment_Stress_Score": 40.0,
        "Payment_Stress_Category": level,
        "Total_Risk_Flags": 3,
        "Risk_Reasons_Text": "High Utilisation, Cash Dependency",
        "Delinquent_NextMonth_Flag": delinquent,
        "Credit Limit": 250000,
        "Utilisation %": 88.0,
        "Avg Payment Ratio": 35.0,
        "Min Due Paid Frequency": 30.0,
        "Recent Spend Change %": -22.0,
        "Cash Withdrawal %": 18.0,
        "Merchant Mix Index": 0.4
    })
}

fn scored_cohort() -> Vec<CustomerRiskRecord> {
    let raw = serde_json::json!([
        customer("C001", "High", 1),
        customer("C002", "Medium", 0),
        customer("C003", "High", 0),
        customer("C004", "Low", 0),
        customer("C005", "Medium", 1),
        customer("C006", "High", 1),
    ]);
    serde_json::from_value(raw).unwrap()
}

#[test]
fn stored_batch_flows_through_filter_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join("session.json"));

    let customers = scored_cohort();
    let counts = aggregate(&customers);
    assert_eq!(counts.count(&RiskLevel::High), 3);
    assert_eq!(counts.count(&RiskLevel::Medium), 2);
    assert_eq!(counts.count(&RiskLevel::Low), 1);

    let session = ScoringSession::new(
        SessionSource::Batch {
            file_name: "cohort.xlsx".to_string(),
        },
        customers,
        counts,
    );
    store.save(&session).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, session);

    let filter = RecordFilter {
        risk: RiskFilter::Medium,
        ..RecordFilter::default()
    };
    let medium = filter.apply(&loaded.customers);
    let ids: Vec<&str> = medium.iter().map(|r| r.customer_id.as_str()).collect();
    assert_eq!(ids, ["C002", "C005"]);

    let csv = to_csv(&medium, &EXPORT_COLUMNS);
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(1).unwrap().starts_with("\"C002\""));
}

#[test]
fn empty_store_has_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join("session.json"));
    assert!(store.load().is_none());

    store.clear().unwrap();
    assert!(store.load().is_none());
}
