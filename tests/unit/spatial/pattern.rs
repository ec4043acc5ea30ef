//! Tests for immutable point patterns and their invariants

#[cfg(test)]
mod tests {
    use spatrecon::AlgorithmError;
    use spatrecon::spatial::pattern::Pattern;
    use spatrecon::spatial::point::{Marks, Point};
    use spatrecon::spatial::window::Window;
    use std::sync::Arc;

    fn unit() -> Arc<Window> {
        Arc::new(Window::unit_square())
    }

    fn three_points() -> Pattern {
        Pattern::new(
            unit(),
            vec![
                Point::new(0.1, 0.1),
                Point::new(0.5, 0.5),
                Point::new(0.9, 0.2),
            ],
        )
        .expect("Failed to create pattern")
    }

    // Tests intensity is points per unit area
    #[test]
    fn test_intensity() {
        let window = Arc::new(Window::rectangle(0.0, 2.0, 0.0, 2.0).expect("Failed to create window"));
        let pattern = Pattern::new(window, vec![Point::new(1.0, 1.0); 8])
            .expect("Failed to create pattern");
        assert!((pattern.intensity() - 2.0).abs() < 1e-12);
    }

    // Tests points outside the window are rejected
    // Verified by skipping the membership check
    #[test]
    fn test_point_outside_window_rejected() {
        let result = Pattern::new(unit(), vec![Point::new(1.5, 0.5)]);
        assert!(matches!(result, Err(AlgorithmError::InvalidPattern { .. })));
    }

    // Tests a zero-area window cannot hold points
    #[test]
    fn test_zero_area_window_rejected() {
        let flat = Arc::new(Window::rectangle(0.0, 1.0, 0.5, 0.5).expect("Failed to create window"));
        let result = Pattern::new(flat, vec![Point::new(0.5, 0.5)]);
        assert!(matches!(result, Err(AlgorithmError::WindowMismatch { .. })));
    }

    // Tests relocation returns a new pattern and leaves the original untouched
    // Verified by mutating the original in place
    #[test]
    fn test_relocated_is_new_value() {
        let pattern = three_points();
        let moved = pattern
            .relocated(1, Point::new(0.7, 0.7))
            .expect("Failed to relocate");
        assert_eq!(pattern.points().get(1), Some(&Point::new(0.5, 0.5)));
        assert_eq!(moved.points().get(1), Some(&Point::new(0.7, 0.7)));
        assert!(pattern.relocated(1, Point::new(2.0, 0.0)).is_err());
        assert!(pattern.relocated(5, Point::new(0.2, 0.2)).is_err());
    }

    // Tests marks must match the point count
    #[test]
    fn test_mark_count_checked() {
        let result = three_points().with_marks(Marks::Numeric(vec![1.0, 2.0]));
        assert!(matches!(result, Err(AlgorithmError::InvalidPattern { .. })));
    }

    // Tests swapping marks requires a marked pattern
    #[test]
    fn test_swapped_marks() {
        let pattern = three_points();
        assert!(matches!(
            pattern.with_swapped_marks(0, 1),
            Err(AlgorithmError::UnexpectedInput { .. })
        ));

        let marked = pattern
            .with_marks(Marks::Numeric(vec![1.0, 2.0, 3.0]))
            .expect("Failed to attach marks");
        let swapped = marked.with_swapped_marks(0, 2).expect("Failed to swap");
        assert_eq!(swapped.marks(), Some(&Marks::Numeric(vec![3.0, 2.0, 1.0])));
        assert_eq!(marked.marks(), Some(&Marks::Numeric(vec![1.0, 2.0, 3.0])));
        assert_eq!(swapped.points(), marked.points());
    }

    // Tests unmarked copies share locations and window
    #[test]
    fn test_unmarked_copy() {
        let marked = three_points()
            .with_marks(Marks::categorical(&["a", "b", "a"]))
            .expect("Failed to attach marks");
        let plain = marked.unmarked();
        assert!(!plain.is_marked());
        assert!(plain.require_marks().is_err());
        assert_eq!(plain.points(), marked.points());
        assert!(Arc::ptr_eq(plain.window_arc(), marked.window_arc()));
    }

    // Tests an empty pattern is allowed with zero intensity
    #[test]
    fn test_empty_pattern() {
        let pattern = Pattern::new(unit(), Vec::new()).expect("Failed to create pattern");
        assert!(pattern.is_empty());
        assert!(pattern.intensity().abs() < f64::EPSILON);
    }
}
