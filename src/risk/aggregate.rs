use super::types::{CustomerRiskRecord, RiskCountsSummary, RiskLevel};

/// Count records per risk level over the whole cohort.
///
/// Callers pass the full session, never a filtered view: the summary cards
/// describe the entire batch whatever filter is active. All three keys are
/// always present in the result; unrecognized levels are not counted.
pub fn aggregate(records: &[CustomerRiskRecord]) -> RiskCountsSummary {
    let mut high = 0;
    let mut medium = 0;
    let mut low = 0;

    for record in records {
        match record.risk_level {
            RiskLevel::High => high += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::Low => low += 1,
            RiskLevel::Unrecognized(_) => {}
        }
    }

    RiskCountsSummary {
        high: Some(high),
        medium: Some(medium),
        low: Some(low),
    }
}

/// Number of records whose risk level is none of the three known labels
pub fn count_unrecognized(records: &[CustomerRiskRecord]) -> usize {
    records.iter().filter(|r| !r.risk_level.is_recognized()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::filter::{filter_records, DelinquencyFilter, RiskFilter};
    use crate::risk::fixtures::{record, six_record_cohort};
    use proptest::prelude::*;

    #[test]
    fn test_aggregate_six_record_cohort() {
        let counts = aggregate(&six_record_cohort());
        assert_eq!(
            counts,
            RiskCountsSummary {
                high: Some(3),
                medium: Some(2),
                low: Some(1),
            }
        );
    }

    #[test]
    fn test_aggregate_empty() {
        let counts = aggregate(&[]);
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.high, Some(0));
    }

    #[test]
    fn test_unrecognized_levels_are_excluded() {
        let records = vec![
            record("A", RiskLevel::High, false),
            record("B", RiskLevel::Unrecognized("n/a".into()), false),
        ];
        let counts = aggregate(&records);
        assert_eq!(counts.total(), 1);
        assert_eq!(count_unrecognized(&records), 1);
    }

    #[test]
    fn test_summary_ignores_active_filter() {
        let cohort = six_record_cohort();
        let visible = filter_records(cohort.clone(), RiskFilter::Medium, DelinquencyFilter::All);
        assert_eq!(visible.len(), 2);
        // Summary is computed from the full cohort, not the visible subset
        assert_eq!(aggregate(&cohort).total(), 6);
    }

    proptest! {
        #[test]
        fn prop_counts_sum_to_record_count(levels in prop::collection::vec(0u8..3, 0..60)) {
            let records: Vec<_> = levels
                .iter()
                .enumerate()
                .map(|(i, l)| {
                    let level = match l {
                        0 => RiskLevel::High,
                        1 => RiskLevel::Medium,
                        _ => RiskLevel::Low,
                    };
                    record(&format!("C{}", i), level, i % 2 == 0)
                })
                .collect();
            prop_assert_eq!(aggregate(&records).total(), records.len() as u64);
        }
    }
}
