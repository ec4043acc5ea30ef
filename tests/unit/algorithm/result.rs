//! Tests for reconstruction results

#[cfg(test)]
mod tests {
    use spatrecon::AlgorithmError;
    use spatrecon::algorithm::result::{
        EnergySample, MarkedReconstructionResult, Reconstruction, ReconstructionOutcome,
        ReconstructionResult, StopReason,
    };
    use spatrecon::spatial::pattern::Pattern;
    use spatrecon::spatial::point::{Marks, Point};
    use spatrecon::spatial::window::Window;
    use std::sync::Arc;

    fn pattern() -> Pattern {
        let points = vec![Point::new(0.25, 0.25), Point::new(0.75, 0.75)];
        Pattern::new(Arc::new(Window::unit_square()), points).expect("Failed to create pattern")
    }

    fn marked() -> Pattern {
        pattern()
            .with_marks(Marks::Numeric(vec![1.0, 2.0]))
            .expect("Failed to attach marks")
    }

    // Tests reconstructions are named in order starting from one
    #[test]
    fn test_names() {
        let result = ReconstructionResult::from_patterns(None, vec![pattern(), pattern(), pattern()]);
        assert_eq!(
            result.names(),
            vec!["randomized_1", "randomized_2", "randomized_3"]
        );
        assert_eq!(result.len(), 3);
        assert!(!result.is_empty());
    }

    // Tests a missing observed pattern is reported
    #[test]
    fn test_require_observed() {
        let detached = ReconstructionResult::from_patterns(None, vec![pattern()]);
        assert!(matches!(
            detached.require_observed(),
            Err(AlgorithmError::MissingObservedPattern)
        ));

        let attached = ReconstructionResult::from_patterns(Some(pattern()), vec![pattern()]);
        assert_eq!(attached.require_observed().ok(), Some(&pattern()));
    }

    // Tests final energy is the last trajectory sample
    #[test]
    fn test_final_energy() {
        let mut reconstruction = Reconstruction::from_pattern(pattern());
        assert_eq!(reconstruction.final_energy(), None);
        reconstruction.trajectory = vec![
            EnergySample { iteration: 1, energy: 0.5 },
            EnergySample { iteration: 2, energy: 0.25 },
        ];
        assert_eq!(reconstruction.final_energy(), Some(0.25));
    }

    // Tests marked results reject unmarked patterns
    #[test]
    fn test_marked_result_validation() {
        let mixed = ReconstructionResult::from_patterns(Some(marked()), vec![pattern()]);
        assert!(matches!(
            MarkedReconstructionResult::new(mixed),
            Err(AlgorithmError::UnexpectedInput { .. })
        ));

        let valid = ReconstructionResult::from_patterns(Some(marked()), vec![marked()]);
        let wrapped = MarkedReconstructionResult::new(valid.clone()).expect("Failed to wrap");
        assert_eq!(wrapped.inner(), &valid);

        let outcome = ReconstructionOutcome::from(wrapped);
        assert_eq!(outcome.result(), &valid);
    }

    // Tests the summary lists each reconstruction with its energy and stop reason
    #[test]
    fn test_display() {
        let reconstruction = Reconstruction {
            pattern: pattern(),
            trajectory: vec![EnergySample { iteration: 1, energy: 0.125 }],
            stop_reason: Some(StopReason::Stagnation),
            iterations: 1,
        };
        let result = ReconstructionResult::new(pattern(), vec![reconstruction]);
        let text = result.to_string();
        assert!(text.contains("Observed pattern: 2 points"));
        assert!(text.contains("randomized_1: 2 points, energy 0.125000"));
        assert!(text.contains("no improvement within window"));
    }
}
