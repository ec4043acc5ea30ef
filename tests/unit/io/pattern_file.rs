//! Tests for pattern file parsing and result exports

#[cfg(test)]
mod tests {
    use spatrecon::AlgorithmError;
    use spatrecon::algorithm::energy::{EnergyReport, NamedEnergy};
    use spatrecon::algorithm::result::{EnergySample, Reconstruction, ReconstructionResult};
    use spatrecon::io::pattern_file::{
        parse_points, parse_window, read_pattern, read_polygon, write_energy_report,
        write_pattern, write_trajectories,
    };
    use spatrecon::spatial::pattern::Pattern;
    use spatrecon::spatial::point::{Marks, Point};
    use spatrecon::spatial::window::Window;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn source() -> &'static Path {
        Path::new("points.csv")
    }

    // Tests headers, comments and blank lines are skipped
    #[test]
    fn test_parse_header_and_comments() {
        let text = "# surveyed 2019\nx,y\n\n0.1,0.2\n0.3 0.4\n";
        let records = parse_points(text, source()).expect("Failed to parse");
        assert_eq!(records.points, vec![Point::new(0.1, 0.2), Point::new(0.3, 0.4)]);
        assert_eq!(records.marks, None);
    }

    // Tests numeric marks are detected when every mark is a number
    #[test]
    fn test_parse_numeric_marks() {
        let records = parse_points("x,y,dbh\n0.1,0.2,12.5\n0.3,0.4,30\n", source())
            .expect("Failed to parse");
        assert_eq!(records.marks, Some(Marks::Numeric(vec![12.5, 30.0])));
    }

    // Tests any non-numeric mark makes the marks categorical
    // Verified by parsing labels individually
    #[test]
    fn test_parse_categorical_marks() {
        let records = parse_points("0.1,0.2,oak\n0.3,0.4,2\n0.5,0.6,oak\n", source())
            .expect("Failed to parse");
        let marks = records.marks.expect("Missing marks");
        assert!(matches!(marks, Marks::Categorical { .. }));
        assert_eq!(marks.label(0), Some("oak".to_string()));
        assert_eq!(marks.label(1), Some("2".to_string()));
        assert_eq!(marks.label(2), Some("oak".to_string()));
    }

    // Tests parse errors report the offending line
    #[test]
    fn test_parse_errors_report_line() {
        let error = parse_points("0.1,0.2\nabc,0.4\n", source()).expect_err("Expected failure");
        assert!(matches!(error, AlgorithmError::PatternParse { line: 2, .. }));

        let error = parse_points("0.1,0.2\n0.3,0.4,5\n", source()).expect_err("Expected failure");
        assert!(matches!(error, AlgorithmError::PatternParse { line: 2, .. }));

        let error = parse_points("0.1\n", source()).expect_err("Expected failure");
        assert!(matches!(error, AlgorithmError::PatternParse { line: 1, .. }));

        let error = parse_points("0.1,inf\n", source()).expect_err("Expected failure");
        assert!(matches!(error, AlgorithmError::PatternParse { line: 1, .. }));
    }

    // Tests a mistyped first data line is reported rather than taken for a header
    // Verified by skipping any unparsable first record
    #[test]
    fn test_mistyped_first_record_rejected() {
        let error = parse_points("0.1,0.2x\n0.3,0.4\n", source()).expect_err("Expected failure");
        assert!(matches!(error, AlgorithmError::PatternParse { line: 1, .. }));

        let records = parse_points("x,y,species\n0.3,0.4,oak\n", source()).expect("Failed to parse");
        assert_eq!(records.points, vec![Point::new(0.3, 0.4)]);
    }

    // Tests rectangle parsing
    #[test]
    fn test_parse_window() {
        let window = parse_window("0,2,-1,1").expect("Failed to parse window");
        assert!((window.area() - 4.0).abs() < 1e-12);
        assert!(parse_window("0 2 -1 1").is_ok());
        assert!(parse_window("0,2,1").is_err());
        assert!(parse_window("2,0,0,1").is_err());
    }

    // Tests patterns survive a write and read through files
    #[test]
    fn test_pattern_file_round_trip() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("pattern.csv");
        let window = Arc::new(Window::unit_square());
        let pattern = Pattern::new(
            Arc::clone(&window),
            vec![Point::new(0.25, 0.5), Point::new(0.75, 0.125)],
        )
        .and_then(|p| p.with_marks(Marks::categorical(&["a", "b"])))
        .expect("Failed to create pattern");

        write_pattern(&path, &pattern).expect("Failed to write pattern");
        let content = fs::read_to_string(&path).expect("Failed to read file");
        assert!(content.starts_with("x,y,mark\n"));

        let read = read_pattern(&path, Some(window)).expect("Failed to read pattern");
        assert_eq!(read, pattern);
    }

    // Tests patterns without a window use the bounding box of their points
    #[test]
    fn test_read_pattern_default_window() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("points.csv");
        fs::write(&path, "1,2\n3,5\n2,3\n").expect("Failed to write file");

        let pattern = read_pattern(&path, None).expect("Failed to read pattern");
        let bounds = pattern.window().bounds();
        assert_eq!((bounds.x_min, bounds.x_max), (1.0, 3.0));
        assert_eq!((bounds.y_min, bounds.y_max), (2.0, 5.0));
    }

    // Tests missing files surface as file system errors
    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let result = read_pattern(&dir.path().join("absent.csv"), None);
        assert!(matches!(result, Err(AlgorithmError::FileSystem { .. })));
    }

    // Tests polygon windows read from vertex files
    #[test]
    fn test_read_polygon() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("window.csv");
        fs::write(&path, "x,y\n0,0\n2,0\n2,1\n0,1\n").expect("Failed to write file");
        let window = read_polygon(&path).expect("Failed to read polygon");
        assert!((window.area() - 2.0).abs() < 1e-12);
    }

    // Tests trajectories and energy reports are written as CSV rows
    #[test]
    fn test_write_reports() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let pattern = Pattern::new(Arc::new(Window::unit_square()), vec![Point::new(0.5, 0.5)])
            .expect("Failed to create pattern");
        let reconstruction = Reconstruction {
            trajectory: vec![
                EnergySample { iteration: 1, energy: 0.5 },
                EnergySample { iteration: 2, energy: 0.25 },
            ],
            iterations: 2,
            ..Reconstruction::from_pattern(pattern.clone())
        };
        let result = ReconstructionResult::new(pattern, vec![reconstruction]);

        let trajectory_path = dir.path().join("trajectory.csv");
        write_trajectories(&trajectory_path, &result).expect("Failed to write trajectory");
        assert_eq!(
            fs::read_to_string(&trajectory_path).expect("Failed to read file"),
            "name,iteration,energy\nrandomized_1,1,0.5\nrandomized_1,2,0.25\n"
        );

        let energy_path = dir.path().join("energy.csv");
        let report = EnergyReport::PerReconstruction(vec![NamedEnergy {
            name: "randomized_1".to_string(),
            energy: 0.25,
        }]);
        write_energy_report(&energy_path, &report).expect("Failed to write energy");
        assert_eq!(
            fs::read_to_string(&energy_path).expect("Failed to read file"),
            "name,energy\nrandomized_1,0.25\n"
        );

        write_energy_report(&energy_path, &EnergyReport::Mean(0.125)).expect("Failed to write energy");
        assert_eq!(
            fs::read_to_string(&energy_path).expect("Failed to read file"),
            "name,energy\nmean,0.125\n"
        );
    }
}
