//! Tests for incrementally maintained candidate statistics

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use spatrecon::algorithm::cache::UnmarkedStatistics;
    use spatrecon::algorithm::energy::unmarked_curves;
    use spatrecon::algorithm::perturbation::uniform_pattern;
    use spatrecon::analysis::curve::RadiusGrid;
    use spatrecon::spatial::window::Window;
    use std::sync::Arc;

    // Tests a new cache counts one full computation
    #[test]
    fn test_new_counts_full_update() {
        let mut rng = StdRng::seed_from_u64(1);
        let pattern =
            uniform_pattern(&Arc::new(Window::unit_square()), 20, &mut rng).expect("Failed to sample");
        let grid = RadiusGrid::for_pattern(&pattern, 20).expect("Failed to create grid");
        let stats = UnmarkedStatistics::new(&pattern, &grid, true, 0.5).expect("Failed to build");
        assert_eq!(stats.stats.full, 1);
        assert_eq!(stats.stats.incremental, 0);
    }

    // Tests relocated statistics match curves computed from scratch
    // Verified by skipping the pair correlation update
    #[test]
    fn test_relocate_matches_unmarked_curves() {
        let window = Arc::new(Window::unit_square());
        let mut rng = StdRng::seed_from_u64(2);
        let mut pattern = uniform_pattern(&window, 30, &mut rng).expect("Failed to sample");
        let grid = RadiusGrid::for_pattern(&pattern, 25).expect("Failed to create grid");
        let mut stats = UnmarkedStatistics::new(&pattern, &grid, true, 0.5).expect("Failed to build");

        for _ in 0..50 {
            let index = rng.random_range(0..pattern.len());
            let target = window.sample_uniform(&mut rng).expect("Failed to sample");
            let next = pattern.relocated(index, target).expect("Failed to relocate");
            stats.relocate(&pattern, &next, index).expect("Failed to update");
            pattern = next;
        }
        assert_eq!(stats.stats.incremental, 50);

        let cached = stats.curves(&pattern).expect("Failed to read curves");
        let fresh = unmarked_curves(&pattern, &grid, true, 0.5).expect("Failed to compute curves");
        for (a, b) in cached.iter().zip(&fresh) {
            for (x, y) in a.values().iter().zip(b.values()) {
                assert!((x - y).abs() < 1e-9 || (x.is_nan() && y.is_nan()));
            }
        }
    }

    // Tests refresh recomputes and counts a full update
    #[test]
    fn test_refresh_counts_full_update() {
        let mut rng = StdRng::seed_from_u64(3);
        let pattern =
            uniform_pattern(&Arc::new(Window::unit_square()), 15, &mut rng).expect("Failed to sample");
        let grid = RadiusGrid::for_pattern(&pattern, 20).expect("Failed to create grid");
        let mut stats = UnmarkedStatistics::new(&pattern, &grid, false, 0.5).expect("Failed to build");
        stats.refresh(&pattern).expect("Failed to refresh");
        assert_eq!(stats.stats.full, 2);
    }
}
