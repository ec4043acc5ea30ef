//! Tests for the mark correlation function kmm(r)

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use spatrecon::AlgorithmError;
    use spatrecon::algorithm::perturbation::uniform_pattern;
    use spatrecon::analysis::curve::{Correction, RadiusGrid};
    use spatrecon::analysis::mark_correlation::{MarkCorrelationState, mark_correlation};
    use spatrecon::spatial::pattern::Pattern;
    use spatrecon::spatial::point::{Marks, Point};
    use spatrecon::spatial::window::Window;
    use std::sync::Arc;

    fn locations(n: usize, seed: u64) -> Pattern {
        let mut rng = StdRng::seed_from_u64(seed);
        uniform_pattern(&Arc::new(Window::unit_square()), n, &mut rng).expect("Failed to sample")
    }

    // Tests constant marks give kmm = 1 wherever pairs are in range
    // Verified by normalising with the mean instead of its square
    #[test]
    fn test_constant_marks_give_one() {
        let pattern = locations(80, 1)
            .with_marks(Marks::Numeric(vec![2.0; 80]))
            .expect("Failed to attach marks");
        let grid = RadiusGrid::for_pattern(&pattern, 30).expect("Failed to create grid");
        let curve = mark_correlation(&pattern, &grid).expect("Failed to estimate kmm");
        assert_eq!(curve.correction(), Correction::Isotropic);
        assert!(
            curve
                .values()
                .iter()
                .filter(|v| v.is_finite())
                .all(|v| (v - 1.0).abs() < 1e-9)
        );
        assert!(curve.values().iter().any(|v| v.is_finite()));
    }

    // Tests unmarked patterns are rejected
    #[test]
    fn test_unmarked_rejected() {
        let pattern = locations(10, 2);
        let grid = RadiusGrid::new(0.2, 10).expect("Failed to create grid");
        assert!(matches!(
            mark_correlation(&pattern, &grid),
            Err(AlgorithmError::UnexpectedInput { .. })
        ));
    }

    // Tests radii without pairs in range are NaN
    #[test]
    fn test_no_pairs_in_range_is_nan() {
        let window = Arc::new(Window::unit_square());
        let pattern = Pattern::new(
            window,
            vec![
                Point::new(0.1, 0.1),
                Point::new(0.9, 0.9),
            ],
        )
        .and_then(|p| p.with_marks(Marks::Numeric(vec![1.0, 2.0])))
        .expect("Failed to create pattern");
        let grid = RadiusGrid::new(0.2, 10).expect("Failed to create grid");
        let curve = mark_correlation(&pattern, &grid).expect("Failed to estimate kmm");
        assert!(curve.values().iter().all(|v| v.is_nan()));
    }

    // Tests incremental swaps agree with a full recomputation for numeric and categorical marks
    // Verified by updating only the first swapped point's pairs
    #[test]
    fn test_swap_matches_full_computation() {
        let base = locations(60, 4);
        let mut rng = StdRng::seed_from_u64(8);
        let numeric = Marks::Numeric((0..60).map(|_| rng.random_range(1.0..10.0)).collect());
        let labels: Vec<&str> = (0..60)
            .map(|k| match k % 3 {
                0 => "a",
                1 => "b",
                _ => "c",
            })
            .collect();
        let categorical = Marks::categorical(&labels);

        for marks in [numeric, categorical] {
            let mut pattern = base.clone().with_marks(marks).expect("Failed to attach marks");
            let grid = RadiusGrid::for_pattern(&pattern, 30).expect("Failed to create grid");
            let mut state =
                MarkCorrelationState::from_pattern(&pattern, &grid).expect("Failed to build state");

            for _ in 0..100 {
                let first = rng.random_range(0..60);
                let second = rng.random_range(0..60);
                state.swap(first, second).expect("Failed to swap");
                pattern = pattern
                    .with_swapped_marks(first, second)
                    .expect("Failed to swap marks");
            }

            assert_eq!(state.marks(), pattern.marks().expect("Pattern lost its marks"));
            let incremental = state.curve().expect("Failed to estimate kmm");
            let full = mark_correlation(&pattern, &grid).expect("Failed to estimate kmm");
            for (a, b) in incremental.values().iter().zip(full.values()) {
                assert!(
                    (a - b).abs() < 1e-9 || (a.is_nan() && b.is_nan()),
                    "Incremental {a} differs from full {b}"
                );
            }
        }
    }
}
