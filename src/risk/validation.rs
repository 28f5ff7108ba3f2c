use super::types::ManualInputProfile;

/// Check a manual input profile before it is sent for scoring.
/// Returns every violation at once (not just the first); an empty list
/// means the profile may be submitted.
pub fn validate_profile(profile: &ManualInputProfile) -> Vec<String> {
    let mut errors = Vec::new();

    if profile.credit_limit.is_nan() || profile.credit_limit <= 0.0 {
        errors.push("Credit limit must be greater than 0.".to_string());
    }
    if !within(profile.utilisation_pct, 0.0, 100.0) {
        errors.push("Utilisation must be between 0 and 100.".to_string());
    }
    if !within(profile.avg_payment_ratio, 0.0, 100.0) {
        errors.push("Avg payment ratio must be between 0 and 100.".to_string());
    }
    if !within(profile.min_due_paid_frequency, 0.0, 100.0) {
        errors.push("Min due paid frequency must be between 0 and 100.".to_string());
    }
    if !within(profile.cash_withdrawal_pct, 0.0, 100.0) {
        errors.push("Cash withdrawal % must be between 0 and 100.".to_string());
    }
    if !within(profile.merchant_mix_index, 0.0, 1.0) {
        errors.push("Merchant mix index must be between 0 and 1.".to_string());
    }
    if !within(profile.recent_spend_change_pct, -100.0, 100.0) {
        errors.push("Recent spend change must be between -100 and +100.".to_string());
    }

    errors
}

/// Inclusive range check; NaN is never within range
fn within(value: f64, min: f64, max: f64) -> bool {
    (min..=max).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_valid() {
        assert!(validate_profile(&ManualInputProfile::default()).is_empty());
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let profile = ManualInputProfile {
            credit_limit: 0.01,
            utilisation_pct: 100.0,
            avg_payment_ratio: 0.0,
            min_due_paid_frequency: 100.0,
            merchant_mix_index: 1.0,
            cash_withdrawal_pct: 0.0,
            recent_spend_change_pct: -100.0,
        };
        assert!(validate_profile(&profile).is_empty());
    }

    #[test]
    fn test_zero_credit_limit_rejected() {
        let profile = ManualInputProfile {
            credit_limit: 0.0,
            ..ManualInputProfile::default()
        };
        let errors = validate_profile(&profile);
        assert_eq!(errors, vec!["Credit limit must be greater than 0.".to_string()]);
    }

    #[test]
    fn test_collects_all_errors() {
        let profile = ManualInputProfile {
            credit_limit: -5.0,    // Error 1
            utilisation_pct: 150.0, // Error 2
            ..ManualInputProfile::default()
        };
        let errors = validate_profile(&profile);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Credit limit"));
        assert!(errors[1].contains("Utilisation"));
    }

    #[test]
    fn test_every_field_out_of_range() {
        let profile = ManualInputProfile {
            credit_limit: -1.0,
            utilisation_pct: -0.1,
            avg_payment_ratio: 100.5,
            min_due_paid_frequency: 101.0,
            merchant_mix_index: 1.2,
            cash_withdrawal_pct: -3.0,
            recent_spend_change_pct: 120.0,
        };
        assert_eq!(validate_profile(&profile).len(), 7);
    }

    #[test]
    fn test_nan_is_rejected() {
        let profile = ManualInputProfile {
            credit_limit: f64::NAN,
            merchant_mix_index: f64::NAN,
            ..ManualInputProfile::default()
        };
        assert_eq!(validate_profile(&profile).len(), 2);
    }

    #[test]
    fn test_negative_spend_change_within_range() {
        let profile = ManualInputProfile {
            recent_spend_change_pct: -45.0,
            ..ManualInputProfile::default()
        };
        assert!(validate_profile(&profile).is_empty());
    }
}
