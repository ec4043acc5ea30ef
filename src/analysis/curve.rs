//! Radius grids and sampled summary functions

use crate::io::configuration::RIPLEY_NEIGHBOUR_LIMIT;
use crate::io::error::{Result, invalid_parameter};
use crate::spatial::pattern::Pattern;
use crate::spatial::window::Window;
use std::f64::consts::PI;
use std::fmt;
use std::ops::Range;

/// Equally spaced radii `0 = r_0 < r_1 < ... < r_{k-1} = r_max`
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusGrid {
    values: Vec<f64>,
    step: f64,
}

impl RadiusGrid {
    /// Grid of `samples` radii from zero to `r_max`
    ///
    /// # Errors
    ///
    /// Returns an error if `r_max` is not positive and finite or fewer than
    /// two samples are requested
    pub fn new(r_max: f64, samples: usize) -> Result<Self> {
        if !r_max.is_finite() || r_max <= 0.0 {
            return Err(invalid_parameter(
                "r_max",
                &r_max,
                &"maximum radius must be positive and finite",
            ));
        }
        if samples < 2 {
            return Err(invalid_parameter(
                "samples",
                &samples,
                &"radius grid needs at least two samples",
            ));
        }

        let last = (samples - 1) as f64;
        let values = (0..samples)
            .map(|k| r_max * k as f64 / last)
            .collect();
        Ok(Self {
            values,
            step: r_max / last,
        })
    }

    /// Grid up to the recommended maximum radius for a window and intensity
    ///
    /// The maximum is a quarter of the shorter side of the window's bounding
    /// box, reduced further for dense patterns so that a disc of that radius
    /// holds about a thousand points on average.
    ///
    /// # Errors
    ///
    /// Returns an error if the intensity is not positive or the window is degenerate
    pub fn recommended(window: &Window, intensity: f64, samples: usize) -> Result<Self> {
        if !intensity.is_finite() || intensity <= 0.0 {
            return Err(invalid_parameter(
                "intensity",
                &intensity,
                &"recommended radius needs a positive finite intensity",
            ));
        }
        let side_limit = window.short_side() / 4.0;
        let neighbour_limit = (RIPLEY_NEIGHBOUR_LIMIT / (PI * intensity)).sqrt();
        Self::new(side_limit.min(neighbour_limit), samples)
    }

    /// Recommended grid for a pattern's window and intensity
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is empty or its window is degenerate
    pub fn for_pattern(pattern: &Pattern, samples: usize) -> Result<Self> {
        Self::recommended(pattern.window(), pattern.intensity(), samples)
    }

    /// Radii in increasing order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of radii
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed grid
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest radius
    pub fn r_max(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// Spacing between consecutive radii
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Indices of radii strictly within `half_width` of `centre`
    pub(crate) fn bin_range(&self, centre: f64, half_width: f64) -> Range<usize> {
        let start = self.values.partition_point(|&r| r <= centre - half_width);
        let end = self.values.partition_point(|&r| r < centre + half_width);
        start..end.max(start)
    }

    /// Index of the first radius at or above `distance`, if any
    pub(crate) fn first_at_or_above(&self, distance: f64) -> Option<usize> {
        let index = self.values.partition_point(|&r| r < distance);
        (index < self.values.len()).then_some(index)
    }
}

/// Summary function a curve estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorKind {
    /// Nearest-neighbour distance distribution G(r)
    NearestNeighbour,
    /// Pair correlation function g(r)
    PairCorrelation,
    /// Mark correlation function kmm(r)
    MarkCorrelation,
}

impl EstimatorKind {
    /// Short conventional symbol
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NearestNeighbour => "G",
            Self::PairCorrelation => "g",
            Self::MarkCorrelation => "kmm",
        }
    }
}

/// Edge correction applied when estimating a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Hanisch reweighting of nearest-neighbour distances
    Hanisch,
    /// Translation correction through the window's set covariance
    Translation,
    /// Ripley's isotropic correction
    Isotropic,
    /// Uncorrected (fast) estimate
    None,
}

impl Correction {
    /// Name used in reports and error messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hanisch => "hanisch",
            Self::Translation => "translation",
            Self::Isotropic => "isotropic",
            Self::None => "none",
        }
    }
}

/// Summary function sampled on a radius grid
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCurve {
    kind: EstimatorKind,
    correction: Correction,
    grid: RadiusGrid,
    values: Vec<f64>,
}

impl SummaryCurve {
    /// Wrap sampled values; `NaN` marks radii without information
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values differs from the grid length
    pub fn new(
        kind: EstimatorKind,
        correction: Correction,
        grid: &RadiusGrid,
        values: Vec<f64>,
    ) -> Result<Self> {
        if values.len() != grid.len() {
            return Err(invalid_parameter(
                "values",
                &values.len(),
                &format!("expected one value per radius ({})", grid.len()),
            ));
        }
        Ok(Self {
            kind,
            correction,
            grid: grid.clone(),
            values,
        })
    }

    /// Estimated function
    pub const fn kind(&self) -> EstimatorKind {
        self.kind
    }

    /// Edge correction used
    pub const fn correction(&self) -> Correction {
        self.correction
    }

    /// Radius grid the curve is sampled on
    pub const fn grid(&self) -> &RadiusGrid {
        &self.grid
    }

    /// Sampled values, one per radius
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the curve has no samples
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for SummaryCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(r) [{}] on {} radii up to {:.4}",
            self.kind.symbol(),
            self.correction.name(),
            self.grid.len(),
            self.grid.r_max()
        )
    }
}
