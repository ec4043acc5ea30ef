//! Tests for acceptance schedules of non-improving proposals

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use spatrecon::algorithm::acceptance::AcceptanceSchedule;

    // Tests strict improvements are always accepted, even greedily
    #[test]
    fn test_improvement_always_accepted() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(AcceptanceSchedule::Greedy.accept(1.0, 0.5, 1, &mut rng));
        assert!(AcceptanceSchedule::default().accept(1.0, 0.5, 500, &mut rng));
    }

    // Tests the greedy schedule rejects ties and deteriorations
    // Verified by accepting ties
    #[test]
    fn test_greedy_rejects_non_improvement() {
        let mut rng = StdRng::seed_from_u64(2);
        for iteration in 1..100 {
            assert!(!AcceptanceSchedule::Greedy.accept(1.0, 1.0, iteration, &mut rng));
            assert!(!AcceptanceSchedule::Greedy.accept(1.0, 2.0, iteration, &mut rng));
        }
    }

    // Tests geometric cooling of the acceptance probability
    #[test]
    fn test_geometric_probability() {
        let schedule = AcceptanceSchedule::Geometric {
            initial_probability: 0.5,
            cooling_rate: 0.5,
        };
        assert!((schedule.probability(1) - 0.5).abs() < 1e-12);
        assert!((schedule.probability(3) - 0.125).abs() < 1e-12);
        assert!(AcceptanceSchedule::Greedy.probability(1).abs() < f64::EPSILON);
    }

    // Tests a certain schedule accepts every proposal
    #[test]
    fn test_certain_acceptance() {
        let schedule = AcceptanceSchedule::Geometric {
            initial_probability: 1.0,
            cooling_rate: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert!((0..100).all(|k| schedule.accept(1.0, 5.0, k + 1, &mut rng)));
    }

    // Tests parameter validation
    #[test]
    fn test_validation() {
        assert!(AcceptanceSchedule::default().validate().is_ok());
        assert!(AcceptanceSchedule::Greedy.validate().is_ok());
        let too_likely = AcceptanceSchedule::Geometric {
            initial_probability: 1.5,
            cooling_rate: 0.9,
        };
        let frozen = AcceptanceSchedule::Geometric {
            initial_probability: 0.1,
            cooling_rate: 0.0,
        };
        assert!(too_likely.validate().is_err());
        assert!(frozen.validate().is_err());
    }
}
