/// Folds a proposed score into an answer's running mean.
///
/// `count` is the number of samples already averaged into `current` (1 for a fresh answer).
/// Returns the new mean and the incremented count.
pub(crate) fn running_mean(current: f64, count: i32, proposed: f64) -> (f64, i32) {
    let samples = f64::from(count.max(1));
    let updated = (current * samples + proposed) / (samples + 1.0);
    (updated, count.max(1) + 1)
}

/// `0 <= score <= max`; NaN never passes.
pub(crate) fn score_in_range(score: f64, max: f64) -> bool {
    (0.0..=max).contains(&score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_mean_follows_recurrence() {
        let (score, count) = running_mean(80.0, 1, 90.0);
        assert_eq!((score, count), (85.0, 2));

        let (score, count) = running_mean(score, count, 70.0);
        assert_eq!((score, count), (80.0, 3));
    }

    #[test]
    fn running_mean_order_matters_only_through_recurrence() {
        let mut state = (50.0, 1);
        for proposed in [100.0, 0.0, 30.0] {
            state = running_mean(state.0, state.1, proposed);
        }
        assert!((state.0 - 45.0).abs() < 1e-9, "{state:?}");
        assert_eq!(state.1, 4);
    }

    #[test]
    fn score_range_is_inclusive() {
        assert!(score_in_range(0.0, 100.0));
        assert!(score_in_range(100.0, 100.0));
        assert!(!score_in_range(100.5, 100.0));
        assert!(!score_in_range(-0.1, 100.0));
        assert!(!score_in_range(f64::NAN, 100.0));
    }
}
