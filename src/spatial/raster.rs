//! Habitat rasters: discrete classes on a regular grid over a rectangular extent

use crate::io::error::{Result, invalid_parameter};
use crate::spatial::point::Point;
use crate::spatial::window::Rectangle;
use ndarray::Array2;

/// Grid of habitat class codes
///
/// Row 0 covers the bottom strip of the extent (`y_min`), column 0 the left
/// strip (`x_min`).
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    cells: Array2<u32>,
    extent: Rectangle,
}

impl Raster {
    /// Create a raster from its cells and extent
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is empty or the extent has no area
    pub fn new(cells: Array2<u32>, extent: Rectangle) -> Result<Self> {
        if cells.is_empty() {
            return Err(invalid_parameter(
                "cells",
                &format!("{:?}", cells.dim()),
                &"raster must have at least one cell",
            ));
        }
        if extent.area() <= 0.0 {
            return Err(invalid_parameter(
                "extent",
                &format!("{extent:?}"),
                &"raster extent must have positive area",
            ));
        }
        Ok(Self { cells, extent })
    }

    /// Class codes indexed by (row, column)
    pub const fn cells(&self) -> &Array2<u32> {
        &self.cells
    }

    /// Spatial extent covered by the grid
    pub const fn extent(&self) -> &Rectangle {
        &self.extent
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    /// Width and height of one cell
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.extent.width() / self.cols() as f64,
            self.extent.height() / self.rows() as f64,
        )
    }

    /// Class of the cell containing `point`, or `None` outside the extent
    ///
    /// Points on the upper or right edge belong to the last row or column.
    pub fn class_at(&self, point: &Point) -> Option<u32> {
        if !self.extent.contains(point) {
            return None;
        }
        let (cell_width, cell_height) = self.cell_size();
        let col = (((point.x - self.extent.x_min) / cell_width) as usize).min(self.cols() - 1);
        let row = (((point.y - self.extent.y_min) / cell_height) as usize).min(self.rows() - 1);
        self.cells.get((row, col)).copied()
    }

    /// Same extent with different cells
    pub(crate) fn with_cells(&self, cells: Array2<u32>) -> Self {
        Self {
            cells,
            extent: self.extent,
        }
    }
}
