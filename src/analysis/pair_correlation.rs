//! Pair correlation function g(r)
//!
//! Exact estimates smooth pair distances with an Epanechnikov kernel and
//! apply the translation correction `|W| / γ_W(x_i - x_j)`, using the pair
//! distance itself as divisor. Fast estimates take the uncorrected K-function,
//! smooth `K(r) / (2πr)` with a penalised cubic spline and differentiate:
//! `g(r) = K'(r) / (2πr) = d/dr[K / 2πr] + K / (2πr²)`.

use crate::analysis::curve::{Correction, EstimatorKind, RadiusGrid, SummaryCurve};
use crate::io::configuration::{DEFAULT_RADIUS_SAMPLES, MAX_EDGE_WEIGHT};
use crate::io::error::{Result, invalid_parameter, invalid_pattern};
use crate::math::interpolation::Cubic;
use crate::math::kernel::Epanechnikov;
use crate::spatial::pattern::Pattern;
use crate::spatial::point::Point;
use crate::spatial::window::Window;
use std::f64::consts::PI;
use std::sync::Arc;

/// How the pair correlation function is estimated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairCorrelationMethod {
    /// Kernel estimate with translation correction
    Exact,
    /// Derivative of a smoothed, uncorrected K-function
    Fast {
        /// Spline smoothing parameter (`spar`)
        smoothing: f64,
    },
}

/// Pair sums behind g(r), updatable when a single point moves
#[derive(Debug, Clone)]
pub struct PairCorrelationState {
    window: Arc<Window>,
    grid: RadiusGrid,
    method: PairCorrelationMethod,
    kernel: Option<Epanechnikov>,
    point_count: usize,
    /// Kernel-weighted sums (exact) or pair counts per distance bin (fast)
    accumulator: Vec<f64>,
}

impl PairCorrelationState {
    /// Accumulate every pair of the pattern
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the pattern has fewer than two points and
    /// `InvalidParameter` for a non-finite smoothing parameter
    pub fn from_pattern(
        pattern: &Pattern,
        grid: &RadiusGrid,
        method: PairCorrelationMethod,
    ) -> Result<Self> {
        let n = pattern.len();
        if n < 2 {
            return Err(invalid_pattern(
                n,
                &"pair correlation needs at least two points",
            ));
        }
        let kernel = match method {
            PairCorrelationMethod::Exact => Some(Epanechnikov::stoyan(pattern.intensity())?),
            PairCorrelationMethod::Fast { smoothing } => {
                if !smoothing.is_finite() {
                    return Err(invalid_parameter(
                        "smoothing",
                        &smoothing,
                        &"smoothing parameter must be finite",
                    ));
                }
                None
            }
        };

        let mut state = Self {
            window: Arc::clone(pattern.window_arc()),
            grid: grid.clone(),
            method,
            kernel,
            point_count: n,
            accumulator: vec![0.0; grid.len()],
        };

        let points = pattern.points();
        for (i, a) in points.iter().enumerate() {
            for b in points.iter().skip(i + 1) {
                state.add_pair(a, b, 1.0);
            }
        }
        Ok(state)
    }

    /// Add (`sign = 1`) or remove (`sign = -1`) the contribution of one unordered pair
    fn add_pair(&mut self, a: &Point, b: &Point, sign: f64) {
        let d = a.distance(b);
        match self.kernel {
            Some(kernel) => {
                if d <= 0.0 {
                    return;
                }
                let (dx, dy) = a.offset_to(b);
                let covariance = self.window.set_covariance(dx, dy);
                let edge = if covariance > 0.0 {
                    (self.window.area() / covariance).min(MAX_EDGE_WEIGHT)
                } else {
                    MAX_EDGE_WEIGHT
                };
                let scale = sign * 2.0 * edge / d;
                let radii = self.grid.values();
                for k in self.grid.bin_range(d, kernel.half_width()) {
                    if let (Some(slot), Some(&r)) = (self.accumulator.get_mut(k), radii.get(k)) {
                        *slot = scale.mul_add(kernel.density(r - d), *slot);
                    }
                }
            }
            None => {
                if let Some(slot) = self
                    .grid
                    .first_at_or_above(d)
                    .and_then(|k| self.accumulator.get_mut(k))
                {
                    *slot += sign * 2.0;
                }
            }
        }
    }

    /// Update after the point at `index` moved from its place in `previous` to its place in `next`
    ///
    /// # Errors
    ///
    /// Returns an error if the patterns differ in size from the state or `index` is out of range
    pub fn relocate(&mut self, previous: &Pattern, next: &Pattern, index: usize) -> Result<()> {
        if previous.len() != self.point_count || next.len() != self.point_count {
            return Err(invalid_pattern(
                next.len(),
                &format!("state tracks {} points", self.point_count),
            ));
        }
        let (Some(&old), Some(&new)) = (previous.points().get(index), next.points().get(index))
        else {
            return Err(invalid_pattern(
                next.len(),
                &format!("no point at index {index}"),
            ));
        };

        for (j, other) in next.points().iter().enumerate() {
            if j != index {
                self.add_pair(&old, other, -1.0);
                self.add_pair(&new, other, 1.0);
            }
        }
        Ok(())
    }

    /// Estimate g(r) from the current sums
    ///
    /// # Errors
    ///
    /// Returns an error if spline smoothing fails in fast mode
    pub fn curve(&self) -> Result<SummaryCurve> {
        let n = self.point_count as f64;
        let area = self.window.area();
        match self.method {
            PairCorrelationMethod::Exact => {
                let scale = area / (2.0 * PI * n * (n - 1.0));
                let values = self
                    .accumulator
                    .iter()
                    .map(|&sum| (scale * sum).max(0.0))
                    .collect();
                SummaryCurve::new(
                    EstimatorKind::PairCorrelation,
                    Correction::Translation,
                    &self.grid,
                    values,
                )
            }
            PairCorrelationMethod::Fast { smoothing } => {
                let scale = area / (n * (n - 1.0));
                let radii = self.grid.values();
                let mut cumulative = 0.0;
                let reduced: Vec<f64> = self
                    .accumulator
                    .iter()
                    .zip(radii)
                    .map(|(&count, &r)| {
                        cumulative += count;
                        let y = scale * cumulative / (2.0 * PI * r);
                        if y.is_finite() { y } else { 0.0 }
                    })
                    .collect();

                let spline = Cubic::smoothing(radii.to_vec(), reduced.clone(), smoothing)?;
                let slopes = spline.knot_derivatives()?;
                let values = slopes
                    .iter()
                    .zip(&reduced)
                    .zip(radii)
                    .map(|((slope, y), &r)| if r > 0.0 { slope + y / r } else { f64::NAN })
                    .collect();
                SummaryCurve::new(
                    EstimatorKind::PairCorrelation,
                    Correction::None,
                    &self.grid,
                    values,
                )
            }
        }
    }
}

/// Pair correlation function with translation edge correction
///
/// # Errors
///
/// Returns `InvalidPattern` if the pattern has fewer than two points
pub fn pair_correlation_exact(pattern: &Pattern, grid: &RadiusGrid) -> Result<SummaryCurve> {
    PairCorrelationState::from_pattern(pattern, grid, PairCorrelationMethod::Exact)?.curve()
}

/// Pair correlation function from the smoothed derivative of an uncorrected K-function
///
/// # Errors
///
/// Returns `InvalidPattern` if the pattern has fewer than two points, or an
/// error if the smoothing parameter is invalid or spline fitting fails
pub fn pair_correlation_fast(
    pattern: &Pattern,
    grid: &RadiusGrid,
    smoothing: f64,
) -> Result<SummaryCurve> {
    PairCorrelationState::from_pattern(pattern, grid, PairCorrelationMethod::Fast { smoothing })?
        .curve()
}

/// Standalone fast pair correlation estimate
///
/// Without an explicit grid the recommended radii for the pattern are used.
///
/// # Errors
///
/// Returns the errors of [`pair_correlation_fast`], and an error if no
/// recommended grid exists for the pattern
pub fn estimate_pcf_fast(
    pattern: &Pattern,
    grid: Option<&RadiusGrid>,
    smoothing: f64,
) -> Result<SummaryCurve> {
    if let Some(grid) = grid {
        return pair_correlation_fast(pattern, grid, smoothing);
    }
    if pattern.len() < 2 {
        return Err(invalid_pattern(
            pattern.len(),
            &"pair correlation needs at least two points",
        ));
    }
    let grid = RadiusGrid::for_pattern(pattern, DEFAULT_RADIUS_SAMPLES)?;
    pair_correlation_fast(pattern, &grid, smoothing)
}
