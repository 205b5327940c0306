//! Publish suppression: report a distance only when it moved.
//!
//! Pure threshold comparison against the previous cycle's distance. The
//! tolerance is absolute (centimetres), not relative: a 0.5 cm threshold
//! means the same thing at 10 cm as at 400 cm.

/// True iff `new_cm` differs from `previous_cm` by more than `threshold_cm`.
///
/// Symmetric in its first two arguments and stateless. With the startup
/// baseline of 0.0 the first real measurement almost always passes.
pub fn should_publish(previous_cm: f64, new_cm: f64, threshold_cm: f64) -> bool {
    (new_cm - previous_cm).abs() > threshold_cm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_tolerance_is_suppressed() {
        assert!(!should_publish(100.0, 100.3, 0.5));
    }

    #[test]
    fn beyond_tolerance_publishes() {
        assert!(should_publish(100.0, 100.6, 0.5));
    }

    #[test]
    fn exactly_at_threshold_is_suppressed() {
        // The contract is strictly-greater-than.
        assert!(!should_publish(100.0, 100.5, 0.5));
    }

    #[test]
    fn first_cycle_against_zero_baseline_publishes() {
        assert!(should_publish(0.0, 50.0, 0.5));
    }

    #[test]
    fn equal_values_never_publish() {
        for threshold in [0.0, 0.5, 10.0] {
            assert!(!should_publish(171.71, 171.71, threshold));
        }
    }

    #[test]
    fn symmetric_in_previous_and_new() {
        assert_eq!(
            should_publish(100.0, 103.0, 0.5),
            should_publish(103.0, 100.0, 0.5)
        );
        assert_eq!(
            should_publish(4.0, 4.2, 0.5),
            should_publish(4.2, 4.0, 0.5)
        );
    }
}
