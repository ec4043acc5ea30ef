//! Point patterns bound to an observation window

use crate::io::error::{AlgorithmError, Result, invalid_pattern};
use crate::spatial::point::{Marks, Point};
use crate::spatial::window::Window;
use std::sync::Arc;

/// Set of points observed in a window, optionally carrying one mark per point
///
/// Every point lies inside the window (boundary inclusive). Perturbations
/// produce new patterns instead of mutating an existing one; the window is
/// shared between all patterns derived from the same observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    window: Arc<Window>,
    points: Vec<Point>,
    marks: Option<Marks>,
    intensity: f64,
}

impl Pattern {
    /// Create an unmarked pattern
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if a point is not finite or lies outside the
    /// window, and `WindowMismatch` if the window has no usable area for a
    /// non-empty pattern
    pub fn new(window: Arc<Window>, points: Vec<Point>) -> Result<Self> {
        let area = window.area();
        if !points.is_empty() && (!area.is_finite() || area <= 0.0) {
            return Err(AlgorithmError::WindowMismatch {
                point_count: points.len(),
                area,
            });
        }

        for (index, point) in points.iter().enumerate() {
            if !point.is_finite() {
                return Err(invalid_pattern(
                    points.len(),
                    &format!("point {index} has non-finite coordinates"),
                ));
            }
            if !window.contains(point) {
                return Err(invalid_pattern(
                    points.len(),
                    &format!(
                        "point {index} at ({}, {}) lies outside the window",
                        point.x, point.y
                    ),
                ));
            }
        }

        let intensity = if points.is_empty() {
            0.0
        } else {
            points.len() as f64 / area
        };

        Ok(Self {
            window,
            points,
            marks: None,
            intensity,
        })
    }

    /// Attach marks, replacing any existing ones
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the mark count differs from the point count
    /// or a mark is not usable (non-finite value, unknown level)
    pub fn with_marks(mut self, marks: Marks) -> Result<Self> {
        if marks.len() != self.points.len() {
            return Err(invalid_pattern(
                self.points.len(),
                &format!("{} marks supplied", marks.len()),
            ));
        }
        if !marks.is_valid() {
            return Err(invalid_pattern(
                self.points.len(),
                &"marks must be finite numbers or known levels",
            ));
        }
        self.marks = Some(marks);
        Ok(self)
    }

    /// Copy of this pattern without marks
    pub fn unmarked(&self) -> Self {
        Self {
            window: Arc::clone(&self.window),
            points: self.points.clone(),
            marks: None,
            intensity: self.intensity,
        }
    }

    /// New pattern with the point at `index` moved to `point`
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or `point` is outside the window
    pub fn relocated(&self, index: usize, point: Point) -> Result<Self> {
        if !point.is_finite() || !self.window.contains(&point) {
            return Err(invalid_pattern(
                self.points.len(),
                &format!("relocation target ({}, {}) lies outside the window", point.x, point.y),
            ));
        }
        let mut next = self.clone();
        let slot = next.points.get_mut(index).ok_or_else(|| {
            invalid_pattern(self.points.len(), &format!("no point at index {index}"))
        })?;
        *slot = point;
        Ok(next)
    }

    /// New pattern with the marks of two points exchanged
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedInput` if the pattern is unmarked and
    /// `InvalidPattern` if an index is out of range
    pub fn with_swapped_marks(&self, first: usize, second: usize) -> Result<Self> {
        let n = self.points.len();
        if first >= n || second >= n {
            return Err(invalid_pattern(
                n,
                &format!("cannot swap marks {first} and {second}"),
            ));
        }
        let mut next = self.clone();
        next.marks
            .as_mut()
            .ok_or_else(|| AlgorithmError::UnexpectedInput {
                expected: "a marked pattern",
                found: "an unmarked pattern".to_string(),
            })?
            .swap(first, second);
        Ok(next)
    }

    /// Observation window
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Shared handle to the observation window
    pub fn window_arc(&self) -> &Arc<Window> {
        &self.window
    }

    /// Point locations
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Marks, if any
    pub const fn marks(&self) -> Option<&Marks> {
        self.marks.as_ref()
    }

    /// Marks, or `UnexpectedInput` if the pattern is unmarked
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern carries no marks
    pub fn require_marks(&self) -> Result<&Marks> {
        self.marks.as_ref().ok_or_else(|| AlgorithmError::UnexpectedInput {
            expected: "a marked pattern",
            found: format!("an unmarked pattern with {} points", self.points.len()),
        })
    }

    /// Whether marks are attached
    pub const fn is_marked(&self) -> bool {
        self.marks.is_some()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the pattern has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points per unit area
    pub const fn intensity(&self) -> f64 {
        self.intensity
    }
}
