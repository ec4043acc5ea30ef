//! Tests for habitat raster lookups

#[cfg(test)]
mod tests {
    use ndarray::array;
    use spatrecon::spatial::point::Point;
    use spatrecon::spatial::raster::Raster;
    use spatrecon::spatial::window::Rectangle;

    fn raster() -> Raster {
        Raster::new(
            array![[1, 2, 3], [4, 5, 6]],
            Rectangle::new(0.0, 3.0, 0.0, 2.0).expect("Failed to create extent"),
        )
        .expect("Failed to create raster")
    }

    // Tests dimensions and cell size
    #[test]
    fn test_raster_dimensions() {
        let raster = raster();
        assert_eq!(raster.rows(), 2);
        assert_eq!(raster.cols(), 3);
        assert_eq!(raster.cell_size(), (1.0, 1.0));
    }

    // Tests row zero covers the bottom of the extent
    // Verified by flipping the row index
    #[test]
    fn test_class_at() {
        let raster = raster();
        assert_eq!(raster.class_at(&Point::new(0.5, 0.5)), Some(1));
        assert_eq!(raster.class_at(&Point::new(2.5, 1.5)), Some(6));
        assert_eq!(raster.class_at(&Point::new(3.0, 2.0)), Some(6));
        assert_eq!(raster.class_at(&Point::new(3.5, 0.5)), None);
    }

    // Tests empty grids are rejected
    #[test]
    fn test_empty_raster_rejected() {
        let cells = ndarray::Array2::<u32>::zeros((0, 3));
        let extent = Rectangle::new(0.0, 1.0, 0.0, 1.0).expect("Failed to create extent");
        assert!(Raster::new(cells, extent).is_err());
    }
}
