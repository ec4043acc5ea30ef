//! Tests for curve distances, weights and batch energy queries

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use spatrecon::AlgorithmError;
    use spatrecon::algorithm::acceptance::AcceptanceSchedule;
    use spatrecon::algorithm::energy::{
        EnergyOptions, EnergyReport, EnergyWeights, EstimationMode, ObservedSummary,
        calculate_energy, curve_distance, energy, energy_all, unmarked_curves,
    };
    use spatrecon::algorithm::executor::{ReconstructionConfig, reconstruct};
    use spatrecon::algorithm::perturbation::uniform_pattern;
    use spatrecon::algorithm::result::{
        MarkedReconstructionResult, ReconstructionOutcome, ReconstructionResult, StopReason,
    };
    use spatrecon::analysis::curve::{Correction, EstimatorKind, RadiusGrid, SummaryCurve};
    use spatrecon::io::progress::NoProgress;
    use spatrecon::spatial::pattern::Pattern;
    use spatrecon::spatial::point::{Marks, Point};
    use spatrecon::spatial::window::Window;
    use std::sync::Arc;

    fn grid() -> RadiusGrid {
        RadiusGrid::new(1.0, 4).expect("Failed to create grid")
    }

    fn curve(kind: EstimatorKind, correction: Correction, values: Vec<f64>) -> SummaryCurve {
        SummaryCurve::new(kind, correction, &grid(), values).expect("Failed to create curve")
    }

    fn pattern(n: usize, seed: u64) -> Pattern {
        let mut rng = StdRng::seed_from_u64(seed);
        uniform_pattern(&Arc::new(Window::unit_square()), n, &mut rng).expect("Failed to sample")
    }

    // Tests the distance averages absolute differences over comparable samples
    // Verified by propagating NaN samples into the mean
    #[test]
    fn test_curve_distance_skips_nan() {
        let a = curve(
            EstimatorKind::PairCorrelation,
            Correction::Translation,
            vec![f64::NAN, 1.0, 2.0, 3.0],
        );
        let b = curve(
            EstimatorKind::PairCorrelation,
            Correction::Translation,
            vec![0.0, 1.5, f64::NAN, 2.0],
        );
        let distance = curve_distance(&a, &b).expect("Failed to compare curves");
        assert!((distance - 0.75).abs() < 1e-12);
    }

    // Tests curves without comparable samples contribute zero
    #[test]
    fn test_curve_distance_all_nan() {
        let a = curve(EstimatorKind::MarkCorrelation, Correction::Isotropic, vec![f64::NAN; 4]);
        let distance = curve_distance(&a, &a).expect("Failed to compare curves");
        assert!(distance.abs() < f64::EPSILON);
    }

    // Tests curves with different corrections cannot be compared
    #[test]
    fn test_correction_mismatch() {
        let exact = curve(EstimatorKind::NearestNeighbour, Correction::Hanisch, vec![0.0; 4]);
        let fast = curve(EstimatorKind::NearestNeighbour, Correction::None, vec![0.0; 4]);
        assert!(matches!(
            curve_distance(&exact, &fast),
            Err(AlgorithmError::ModeMismatch { .. })
        ));
    }

    // Tests weights must be non-negative and sum into (0, 1]
    // Verified by accepting sums above one
    #[test]
    fn test_weight_validation() {
        assert!(EnergyWeights::new(vec![0.5, 0.5]).is_ok());
        assert!(EnergyWeights::new(vec![0.3, 0.3]).is_ok());
        for invalid in [vec![0.6, 0.6], vec![0.0, 0.0], vec![-0.1, 0.5], vec![]] {
            assert!(matches!(
                EnergyWeights::new(invalid),
                Err(AlgorithmError::InvalidWeight { .. })
            ));
        }
    }

    // Tests the energy is the weighted sum of channel distances
    #[test]
    fn test_weighted_energy() {
        let observed = vec![
            curve(EstimatorKind::NearestNeighbour, Correction::None, vec![0.0; 4]),
            curve(EstimatorKind::PairCorrelation, Correction::None, vec![1.0; 4]),
        ];
        let candidate = vec![
            curve(EstimatorKind::NearestNeighbour, Correction::None, vec![0.2; 4]),
            curve(EstimatorKind::PairCorrelation, Correction::None, vec![2.0; 4]),
        ];
        let weights = EnergyWeights::new(vec![0.5, 0.25]).expect("Failed to create weights");
        let value = energy(&observed, &candidate, &weights).expect("Failed to compute energy");
        assert!((value - 0.35).abs() < 1e-12);

        let single = EnergyWeights::new(vec![1.0]).expect("Failed to create weights");
        assert!(energy(&observed, &candidate, &single).is_err());
    }

    // Tests the automatic mode threshold is inclusive for exact estimation
    #[test]
    fn test_estimation_mode_threshold() {
        assert!(EstimationMode::Auto.is_exact(1000, 1000));
        assert!(!EstimationMode::Auto.is_exact(1001, 1000));
        assert!(EstimationMode::Exact.is_exact(5000, 1000));
        assert!(!EstimationMode::Fast.is_exact(10, 1000));
    }

    // Tests a pattern has zero energy against itself
    #[test]
    fn test_self_energy_is_zero() {
        let observed = pattern(50, 4);
        let result =
            ReconstructionResult::from_patterns(Some(observed.clone()), vec![observed.clone()]);
        let energies = energy_all(
            &ReconstructionOutcome::Unmarked(result),
            &EnergyWeights::default(),
            1000,
            &NoProgress,
        )
        .expect("Failed to compute energies");
        assert_eq!(energies.len(), 1);
        assert!(energies.iter().all(|e| e.abs() < 1e-12));
    }

    // Tests energies are reported per reconstruction in order, or as their mean
    // Verified by reversing the reconstruction order
    #[test]
    fn test_calculate_energy_names_and_mean() {
        let observed = pattern(40, 5);
        let candidates = vec![pattern(40, 6), observed.clone(), pattern(40, 7)];
        let outcome = ReconstructionOutcome::Unmarked(ReconstructionResult::from_patterns(
            Some(observed),
            candidates,
        ));

        let report = calculate_energy(&outcome, &EnergyOptions::default(), &NoProgress)
            .expect("Failed to compute energy");
        let EnergyReport::PerReconstruction(named) = report else {
            unreachable!("Expected per-reconstruction energies");
        };
        let names: Vec<&str> = named.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["randomized_1", "randomized_2", "randomized_3"]);
        assert!(named.get(1).is_some_and(|n| n.energy.abs() < 1e-12));
        assert!(named.iter().all(|n| n.energy >= 0.0));

        let options = EnergyOptions {
            reduce_to_mean: true,
            ..EnergyOptions::default()
        };
        let mean = calculate_energy(&outcome, &options, &NoProgress).expect("Failed to compute");
        let expected = named.iter().map(|n| n.energy).sum::<f64>() / 3.0;
        match mean {
            EnergyReport::Mean(value) => assert!((value - expected).abs() < 1e-12),
            EnergyReport::PerReconstruction(_) => unreachable!("Expected mean energy"),
        }
    }

    // Tests invalid weights are rejected before any energy is computed
    #[test]
    fn test_calculate_energy_weight_errors() {
        let observed = pattern(30, 8);
        let outcome = ReconstructionOutcome::Unmarked(ReconstructionResult::from_patterns(
            Some(observed.clone()),
            vec![observed],
        ));
        for weights in [vec![0.6, 0.6], vec![0.0, 0.0]] {
            let options = EnergyOptions {
                weights,
                ..EnergyOptions::default()
            };
            assert!(matches!(
                calculate_energy(&outcome, &options, &NoProgress),
                Err(AlgorithmError::InvalidWeight { .. })
            ));
        }
        let options = EnergyOptions {
            weights: vec![0.3, 0.3],
            ..EnergyOptions::default()
        };
        assert!(calculate_energy(&outcome, &options, &NoProgress).is_ok());
    }

    // Tests a result without an observed pattern cannot be evaluated
    #[test]
    fn test_missing_observed_pattern() {
        let outcome = ReconstructionOutcome::Unmarked(ReconstructionResult::from_patterns(
            None,
            vec![pattern(20, 9)],
        ));
        assert!(matches!(
            calculate_energy(&outcome, &EnergyOptions::default(), &NoProgress),
            Err(AlgorithmError::MissingObservedPattern)
        ));
    }

    // Tests marked results use the mark correlation channel regardless of weights
    #[test]
    fn test_marked_energy_ignores_weights() {
        let marks = Marks::categorical(&(0..40).map(|k| if k % 2 == 0 { "a" } else { "b" }).collect::<Vec<_>>());
        let observed = pattern(40, 10)
            .with_marks(marks)
            .expect("Failed to attach marks");
        let result = ReconstructionResult::from_patterns(Some(observed.clone()), vec![observed]);
        let outcome = ReconstructionOutcome::Marked(
            MarkedReconstructionResult::new(result).expect("Failed to wrap marked result"),
        );
        let options = EnergyOptions {
            weights: vec![0.9, 0.9],
            ..EnergyOptions::default()
        };
        let report = calculate_energy(&outcome, &options, &NoProgress).expect("Failed to compute");
        match report {
            EnergyReport::PerReconstruction(named) => {
                assert!(named.iter().all(|n| n.energy.abs() < 1e-12));
            }
            EnergyReport::Mean(_) => unreachable!("Expected per-reconstruction energies"),
        }
    }

    // Tests exact and fast curves of a pattern have the channel order G then g
    #[test]
    fn test_unmarked_curve_order() {
        let observed = pattern(30, 11);
        let grid = RadiusGrid::for_pattern(&observed, 20).expect("Failed to create grid");
        let curves = unmarked_curves(&observed, &grid, false, 0.5).expect("Failed to compute");
        let kinds: Vec<EstimatorKind> = curves.iter().map(SummaryCurve::kind).collect();
        assert_eq!(
            kinds,
            [EstimatorKind::NearestNeighbour, EstimatorKind::PairCorrelation]
        );
    }

    fn boundary_hugging() -> Pattern {
        let points = vec![
            Point::new(0.01, 0.5),
            Point::new(0.99, 0.5),
            Point::new(0.5, 0.01),
        ];
        Pattern::new(Arc::new(Window::unit_square()), points).expect("Failed to create pattern")
    }

    // Tests an observed G(r) without finite samples is detected once and contributes no energy
    // Verified by reporting every channel as undefined
    #[test]
    fn test_undefined_observed_channel() {
        let observed = boundary_hugging();
        let summary =
            ObservedSummary::unmarked(&observed, true, 30, 0.5).expect("Failed to summarise");
        assert_eq!(
            summary.undefined_channels(),
            vec![EstimatorKind::NearestNeighbour]
        );

        let candidate = unmarked_curves(&pattern(3, 21), summary.grid(), true, 0.5)
            .expect("Failed to compute curves");
        let nearest_observed = summary.curves().first().expect("Missing G curve");
        let nearest_candidate = candidate.first().expect("Missing G curve");
        let distance =
            curve_distance(nearest_observed, nearest_candidate).expect("Failed to compare");
        assert!(distance.abs() < f64::EPSILON);
    }

    // Tests reconstruction of a pattern with an undefined observed channel runs to completion
    #[test]
    fn test_reconstruct_with_undefined_channel() {
        let observed = boundary_hugging();
        let config = ReconstructionConfig {
            radius_samples: 30,
            acceptance: AcceptanceSchedule::Greedy,
            ..ReconstructionConfig::new(1, 200, 200, EstimationMode::Exact)
        };
        let result = reconstruct(&observed, &config, &NoProgress).expect("Reconstruction failed");
        let reconstruction = result.reconstructions().first().expect("Missing reconstruction");
        assert!(reconstruction.stop_reason.is_some());
        assert!(
            reconstruction
                .trajectory
                .iter()
                .all(|sample| sample.energy.is_finite())
        );
        assert!(matches!(
            reconstruction.stop_reason,
            Some(StopReason::MaxIterations | StopReason::Stagnation)
        ));
    }

    // Tests the weight count is checked whether energies are stored or recomputed
    // Verified by validating the count only on recomputation
    #[test]
    fn test_weight_count_checked_for_stored_energies() {
        let observed = pattern(20, 22);
        let config = ReconstructionConfig {
            radius_samples: 20,
            ..ReconstructionConfig::new(1, 5, 5, EstimationMode::Exact)
        };
        let stored = reconstruct(&observed, &config, &NoProgress).expect("Reconstruction failed");
        let recomputed = ReconstructionResult::from_patterns(
            stored.observed().cloned(),
            stored.patterns().cloned().collect(),
        );
        let single = EnergyOptions {
            weights: vec![1.0],
            radius_samples: 20,
            ..EnergyOptions::default()
        };

        for result in [stored, recomputed] {
            assert!(matches!(
                calculate_energy(&ReconstructionOutcome::Unmarked(result), &single, &NoProgress),
                Err(AlgorithmError::InvalidWeight { .. })
            ));
        }
    }
}
