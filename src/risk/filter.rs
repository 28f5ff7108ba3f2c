use super::types::{CustomerRiskRecord, RiskLevel};

/// Risk-level filter offered on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RiskFilter {
    #[default]
    All,
    High,
    Medium,
    Low,
}

impl RiskFilter {
    pub fn accepts(self, level: &RiskLevel) -> bool {
        match self {
            RiskFilter::All => true,
            RiskFilter::High => *level == RiskLevel::High,
            RiskFilter::Medium => *level == RiskLevel::Medium,
            RiskFilter::Low => *level == RiskLevel::Low,
        }
    }

    /// Next filter in tab order, wrapping around
    pub fn cycle(self) -> Self {
        match self {
            RiskFilter::All => RiskFilter::High,
            RiskFilter::High => RiskFilter::Medium,
            RiskFilter::Medium => RiskFilter::Low,
            RiskFilter::Low => RiskFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskFilter::All => "All",
            RiskFilter::High => "High",
            RiskFilter::Medium => "Medium",
            RiskFilter::Low => "Low",
        }
    }
}

/// Delinquency filter: `Yes` keeps accounts predicted delinquent next month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DelinquencyFilter {
    #[default]
    All,
    Yes,
    No,
}

impl DelinquencyFilter {
    pub fn accepts(self, delinquent: bool) -> bool {
        match self {
            DelinquencyFilter::All => true,
            DelinquencyFilter::Yes => delinquent,
            DelinquencyFilter::No => !delinquent,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            DelinquencyFilter::All => DelinquencyFilter::Yes,
            DelinquencyFilter::Yes => DelinquencyFilter::No,
            DelinquencyFilter::No => DelinquencyFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DelinquencyFilter::All => "All",
            DelinquencyFilter::Yes => "Delinquent",
            DelinquencyFilter::No => "Not Delinquent",
        }
    }
}

/// Both results-screen filters, combined with logical AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordFilter {
    pub risk: RiskFilter,
    pub delinquency: DelinquencyFilter,
}

impl RecordFilter {
    pub fn new(risk: RiskFilter, delinquency: DelinquencyFilter) -> Self {
        Self { risk, delinquency }
    }

    pub fn matches(&self, record: &CustomerRiskRecord) -> bool {
        self.risk.accepts(&record.risk_level) && self.delinquency.accepts(record.delinquent_next_month)
    }

    /// Borrow the matching records, keeping their original order.
    pub fn apply<'a>(&self, records: &'a [CustomerRiskRecord]) -> Vec<&'a CustomerRiskRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.risk == RiskFilter::All && self.delinquency == DelinquencyFilter::All
    }
}

/// Keep only the records passing both filters, in their original order.
pub fn filter_records(
    records: Vec<CustomerRiskRecord>,
    risk: RiskFilter,
    delinquency: DelinquencyFilter,
) -> Vec<CustomerRiskRecord> {
    let filter = RecordFilter::new(risk, delinquency);
    records.into_iter().filter(|r| filter.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::fixtures::{record, six_record_cohort};
    use proptest::prelude::*;

    fn ids(records: &[CustomerRiskRecord]) -> Vec<&str> {
        records.iter().map(|r| r.customer_id.as_str()).collect()
    }

    #[test]
    fn test_all_all_is_identity() {
        let cohort = six_record_cohort();
        let filtered = filter_records(cohort.clone(), RiskFilter::All, DelinquencyFilter::All);
        assert_eq!(filtered, cohort);
    }

    #[test]
    fn test_medium_keeps_original_order() {
        let filtered = filter_records(six_record_cohort(), RiskFilter::Medium, DelinquencyFilter::All);
        assert_eq!(ids(&filtered), vec!["C002", "C005"]);
    }

    #[test]
    fn test_delinquency_yes_and_no() {
        let records = vec![
            record("A", RiskLevel::High, true),
            record("B", RiskLevel::High, false),
            record("C", RiskLevel::Low, true),
        ];
        let yes = filter_records(records.clone(), RiskFilter::All, DelinquencyFilter::Yes);
        assert_eq!(ids(&yes), vec!["A", "C"]);

        let no = filter_records(records, RiskFilter::All, DelinquencyFilter::No);
        assert_eq!(ids(&no), vec!["B"]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let records = vec![
            record("A", RiskLevel::High, true),
            record("B", RiskLevel::High, false),
            record("C", RiskLevel::Low, true),
        ];
        let filtered = filter_records(records, RiskFilter::High, DelinquencyFilter::Yes);
        assert_eq!(ids(&filtered), vec!["A"]);
    }

    #[test]
    fn test_unrecognized_level_only_passes_all() {
        let records = vec![record("X", RiskLevel::Unrecognized("Critical".into()), false)];
        assert_eq!(filter_records(records.clone(), RiskFilter::All, DelinquencyFilter::All).len(), 1);
        assert!(filter_records(records.clone(), RiskFilter::High, DelinquencyFilter::All).is_empty());
        assert!(filter_records(records, RiskFilter::Low, DelinquencyFilter::All).is_empty());
    }

    #[test]
    fn test_apply_borrows_in_order() {
        let cohort = six_record_cohort();
        let filter = RecordFilter::new(RiskFilter::High, DelinquencyFilter::All);
        let selected: Vec<&str> = filter.apply(&cohort).iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(selected, vec!["C001", "C003", "C006"]);
    }

    #[test]
    fn test_cycle_wraps_around() {
        let mut risk = RiskFilter::All;
        for _ in 0..4 {
            risk = risk.cycle();
        }
        assert_eq!(risk, RiskFilter::All);
        assert_eq!(DelinquencyFilter::No.cycle(), DelinquencyFilter::All);
    }

    fn any_level() -> impl Strategy<Value = RiskLevel> {
        prop_oneof![
            Just(RiskLevel::High),
            Just(RiskLevel::Medium),
            Just(RiskLevel::Low),
            Just(RiskLevel::Unrecognized("Unknown".to_string())),
        ]
    }

    fn any_risk_filter() -> impl Strategy<Value = RiskFilter> {
        prop_oneof![
            Just(RiskFilter::All),
            Just(RiskFilter::High),
            Just(RiskFilter::Medium),
            Just(RiskFilter::Low),
        ]
    }

    fn any_delinquency_filter() -> impl Strategy<Value = DelinquencyFilter> {
        prop_oneof![
            Just(DelinquencyFilter::All),
            Just(DelinquencyFilter::Yes),
            Just(DelinquencyFilter::No),
        ]
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(
            rows in prop::collection::vec((any_level(), any::<bool>()), 0..40),
            risk in any_risk_filter(),
            delinquency in any_delinquency_filter(),
        ) {
            let records: Vec<_> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (level, delinquent))| record(&format!("C{:03}", i), level, delinquent))
                .collect();
            let once = filter_records(records, risk, delinquency);
            let twice = filter_records(once.clone(), risk, delinquency);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_filter_preserves_relative_order(
            rows in prop::collection::vec((any_level(), any::<bool>()), 0..40),
            risk in any_risk_filter(),
            delinquency in any_delinquency_filter(),
        ) {
            let records: Vec<_> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (level, delinquent))| record(&format!("C{:03}", i), level, delinquent))
                .collect();
            let filtered = filter_records(records, risk, delinquency);
            let ids: Vec<_> = filtered.iter().map(|r| r.customer_id.clone()).collect();
            let mut sorted = ids.clone();
            sorted.sort();
            prop_assert_eq!(ids, sorted);
        }
    }
}
