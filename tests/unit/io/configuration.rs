//! Tests for configuration constants

#[cfg(test)]
mod tests {
    use spatrecon::io::configuration::{
        DEFAULT_ANNEALING_PROBABILITY, DEFAULT_COOLING_RATE, DEFAULT_FAST_THRESHOLD,
        DEFAULT_NO_IMPROVEMENT_WINDOW, DEFAULT_RADIUS_SAMPLES, DEFAULT_SMOOTHING, DEFAULT_WEIGHTS,
        ENERGY_SUFFIX, MAX_INDIVIDUAL_PROGRESS_BARS, RANDOMIZED_NAME_PREFIX, STOYAN_COEFFICIENT,
        TRAJECTORY_SUFFIX,
    };

    // Tests default weights split the energy evenly between channels
    // Verified by changing the default weights
    #[test]
    fn test_default_weights() {
        assert_eq!(DEFAULT_WEIGHTS, [0.5, 0.5]);
        assert!((DEFAULT_WEIGHTS.iter().sum::<f64>() - 1.0).abs() < f64::EPSILON);
    }

    // Tests estimator defaults
    #[test]
    fn test_estimator_defaults() {
        assert_eq!(DEFAULT_RADIUS_SAMPLES, 250);
        assert_eq!(DEFAULT_FAST_THRESHOLD, 1000);
        assert!((STOYAN_COEFFICIENT - 0.15).abs() < f64::EPSILON);
        assert!(DEFAULT_SMOOTHING > 0.0 && DEFAULT_SMOOTHING < 1.5);
    }

    // Tests annealing defaults describe a decaying acceptance probability
    #[test]
    fn test_annealing_defaults() {
        assert!(DEFAULT_ANNEALING_PROBABILITY > 0.0 && DEFAULT_ANNEALING_PROBABILITY <= 1.0);
        assert!(DEFAULT_COOLING_RATE > 0.0 && DEFAULT_COOLING_RATE < 1.0);
        assert!(DEFAULT_NO_IMPROVEMENT_WINDOW > 0);
    }

    // Tests output naming constants
    #[test]
    fn test_output_names() {
        assert_eq!(RANDOMIZED_NAME_PREFIX, "randomized_");
        assert_eq!(TRAJECTORY_SUFFIX, "_trajectory");
        assert_eq!(ENERGY_SUFFIX, "_energy");
        assert!(MAX_INDIVIDUAL_PROGRESS_BARS > 0);
    }
}
