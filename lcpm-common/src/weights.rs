//! Sibling weight validation and even distribution
//!
//! Every set of sibling nodes (grades under a project, books under a grade,
//! units under a book, lessons under a unit, stages under a project) carries
//! percentage weights that should sum to 100. Validation tolerates small
//! floating point drift; distribution produces exact integer weights.

/// Allowed deviation of a sibling weight sum from 100
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.1;

/// Check whether a sibling weight set sums to 100 within tolerance
///
/// [33.0, 33.0, 34.0] is valid; [33.0, 33.0, 33.0] is not (sums to 99).
/// An empty set is vacuously valid: there is no invariant to violate
/// until siblings exist.
pub fn validate_weights(weights: &[f64]) -> bool {
    if weights.is_empty() {
        return true;
    }
    let sum: f64 = weights.iter().sum();
    (sum - 100.0).abs() <= WEIGHT_SUM_TOLERANCE
}

/// Distribute 100 percentage points evenly across `count` siblings
///
/// Integer division puts `floor(100 / count)` on every sibling; the
/// remainder goes to index 0, so the result always sums to exactly 100.
/// Callers pair the result positionally with an order_index-sorted
/// sibling list (the first sibling absorbs the remainder).
///
/// Returns an empty vector for count 0.
pub fn distribute_evenly(count: usize) -> Vec<i64> {
    if count == 0 {
        return Vec::new();
    }
    let base = 100 / count as i64;
    let remainder = 100 - base * count as i64;

    let mut weights = vec![base; count];
    weights[0] += remainder;
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_within_tolerance() {
        assert!(validate_weights(&[33.0, 33.0, 34.0]));
        assert!(validate_weights(&[100.0]));
        assert!(validate_weights(&[50.0, 50.0]));
        assert!(validate_weights(&[33.3, 33.3, 33.4]));
        // Exactly at the tolerance boundary
        assert!(validate_weights(&[50.0, 50.1]));
        assert!(validate_weights(&[50.0, 49.9]));
    }

    #[test]
    fn test_validate_outside_tolerance() {
        assert!(!validate_weights(&[33.0, 33.0, 33.0])); // sums to 99
        assert!(!validate_weights(&[50.0, 50.2]));
        assert!(!validate_weights(&[0.0]));
        assert!(!validate_weights(&[100.0, 100.0]));
    }

    #[test]
    fn test_validate_empty_is_vacuously_valid() {
        assert!(validate_weights(&[]));
    }

    #[test]
    fn test_distribute_sums_to_exactly_100() {
        for count in 1..=50 {
            let weights = distribute_evenly(count);
            assert_eq!(weights.len(), count);
            assert_eq!(
                weights.iter().sum::<i64>(),
                100,
                "Sum must be exactly 100 for count {}",
                count
            );
        }
    }

    #[test]
    fn test_distribute_first_absorbs_remainder() {
        assert_eq!(distribute_evenly(1), vec![100]);
        assert_eq!(distribute_evenly(2), vec![50, 50]);
        assert_eq!(distribute_evenly(3), vec![34, 33, 33]);
        assert_eq!(distribute_evenly(4), vec![25, 25, 25, 25]);
        assert_eq!(distribute_evenly(6), vec![20, 16, 16, 16, 16, 16]);
        assert_eq!(distribute_evenly(7), vec![16, 14, 14, 14, 14, 14, 14]);
    }

    #[test]
    fn test_distribute_zero_count() {
        assert!(distribute_evenly(0).is_empty());
    }

    #[test]
    fn test_distributed_weights_validate() {
        for count in 1..=20 {
            let weights: Vec<f64> = distribute_evenly(count).iter().map(|w| *w as f64).collect();
            assert!(
                validate_weights(&weights),
                "Distributed weights must pass validation for count {}",
                count
            );
        }
    }
}
