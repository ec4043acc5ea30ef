//! Mark correlation function kmm(r)
//!
//! `kmm(r) = Σ f(m_i, m_j) w_ij(r) / Σ w_ij(r) / E[f]`, where `f` is the mark
//! product (numeric marks) or the indicator of equal levels (categorical
//! marks) and `w_ij(r)` combines an Epanechnikov kernel in `r - d_ij` with
//! Ripley's isotropic edge weights of both points. Kernel weights only depend
//! on locations, so they are tabulated once per pair and a mark swap just
//! reweights the pairs touching the two swapped points.

use crate::analysis::curve::{Correction, EstimatorKind, RadiusGrid, SummaryCurve};
use crate::io::configuration::MAX_EDGE_WEIGHT;
use crate::io::error::{Result, invalid_parameter, invalid_pattern};
use crate::math::kernel::Epanechnikov;
use crate::spatial::pattern::Pattern;
use crate::spatial::point::{Marks, Point};
use crate::spatial::window::Window;

/// Tabulated kernel weights of one unordered pair within range
#[derive(Debug, Clone)]
struct PairWeights {
    first: usize,
    second: usize,
    start: usize,
    weights: Vec<f64>,
}

impl PairWeights {
    const fn other(&self, index: usize) -> usize {
        if self.first == index {
            self.second
        } else {
            self.first
        }
    }

    fn add_to(&self, sums: &mut [f64], factor: f64) {
        for (slot, w) in sums.iter_mut().skip(self.start).zip(&self.weights) {
            *slot = factor.mul_add(*w, *slot);
        }
    }
}

fn isotropic_weight(window: &Window, point: &Point, r: f64) -> f64 {
    let fraction = window.isotropic_fraction(point, r);
    if fraction > 0.0 {
        (1.0 / fraction).min(MAX_EDGE_WEIGHT)
    } else {
        MAX_EDGE_WEIGHT
    }
}

/// Mark correlation sums for a fixed set of locations, updatable by mark swaps
#[derive(Debug, Clone)]
pub struct MarkCorrelationState {
    grid: RadiusGrid,
    marks: Marks,
    pairs: Vec<PairWeights>,
    /// Indices into `pairs` of every pair each point belongs to
    memberships: Vec<Vec<usize>>,
    numerator: Vec<f64>,
    denominator: Vec<f64>,
    normaliser: f64,
}

impl MarkCorrelationState {
    /// Tabulate pair weights and mark sums of a marked pattern
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedInput` if the pattern carries no marks and
    /// `InvalidPattern` if it has fewer than two points
    pub fn from_pattern(pattern: &Pattern, grid: &RadiusGrid) -> Result<Self> {
        let marks = pattern.require_marks()?.clone();
        let n = pattern.len();
        if n < 2 {
            return Err(invalid_pattern(
                n,
                &"mark correlation needs at least two points",
            ));
        }

        let kernel = Epanechnikov::stoyan(pattern.intensity())?;
        let reach = grid.r_max() + kernel.half_width();
        let window = pattern.window();
        let points = pattern.points();
        let radii = grid.values();

        let mut pairs = Vec::new();
        let mut memberships = vec![Vec::new(); n];
        for (i, a) in points.iter().enumerate() {
            for (j, b) in points.iter().enumerate().skip(i + 1) {
                let d = a.distance(b);
                if d > reach || d <= 0.0 {
                    continue;
                }
                let range = grid.bin_range(d, kernel.half_width());
                if range.is_empty() {
                    continue;
                }
                let edge = isotropic_weight(window, a, d) + isotropic_weight(window, b, d);
                let start = range.start;
                let weights = range
                    .filter_map(|k| radii.get(k).map(|&r| kernel.density(r - d) * edge))
                    .collect();

                let slot = pairs.len();
                pairs.push(PairWeights {
                    first: i,
                    second: j,
                    start,
                    weights,
                });
                for member in [i, j] {
                    if let Some(list) = memberships.get_mut(member) {
                        list.push(slot);
                    }
                }
            }
        }

        let mut numerator = vec![0.0; grid.len()];
        let mut denominator = vec![0.0; grid.len()];
        for pair in &pairs {
            pair.add_to(&mut numerator, marks.pair_term(pair.first, pair.second));
            pair.add_to(&mut denominator, 1.0);
        }

        Ok(Self {
            grid: grid.clone(),
            normaliser: marks.normaliser(),
            marks,
            pairs,
            memberships,
            numerator,
            denominator,
        })
    }

    /// Exchange the marks of two points and update the sums
    ///
    /// Only pairs involving exactly one of the two points change.
    ///
    /// # Errors
    ///
    /// Returns an error if an index is out of range
    pub fn swap(&mut self, first: usize, second: usize) -> Result<()> {
        let n = self.marks.len();
        if first >= n || second >= n {
            return Err(invalid_parameter(
                "index",
                &format!("({first}, {second})"),
                &format!("pattern has {n} points"),
            ));
        }
        if first == second {
            return Ok(());
        }

        for (moved, partner) in [(first, second), (second, first)] {
            let Some(members) = self.memberships.get(moved) else {
                continue;
            };
            for pair in members.iter().filter_map(|&slot| self.pairs.get(slot)) {
                let other = pair.other(moved);
                if other == partner {
                    continue;
                }
                // After the swap `moved` carries the mark `partner` has now
                let delta =
                    self.marks.pair_term(partner, other) - self.marks.pair_term(moved, other);
                if delta != 0.0 {
                    pair.add_to(&mut self.numerator, delta);
                }
            }
        }
        self.marks.swap(first, second);
        Ok(())
    }

    /// Current marks
    pub const fn marks(&self) -> &Marks {
        &self.marks
    }

    /// Estimate kmm(r); `NaN` where no pair is in range
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be assembled
    pub fn curve(&self) -> Result<SummaryCurve> {
        let values = self
            .numerator
            .iter()
            .zip(&self.denominator)
            .map(|(&num, &den)| {
                if den > 0.0 && self.normaliser.is_finite() && self.normaliser > 0.0 {
                    num / den / self.normaliser
                } else {
                    f64::NAN
                }
            })
            .collect();
        SummaryCurve::new(
            EstimatorKind::MarkCorrelation,
            Correction::Isotropic,
            &self.grid,
            values,
        )
    }
}

/// Mark correlation function with isotropic edge correction
///
/// # Errors
///
/// Returns `UnexpectedInput` for unmarked patterns and `InvalidPattern` for
/// patterns with fewer than two points
pub fn mark_correlation(pattern: &Pattern, grid: &RadiusGrid) -> Result<SummaryCurve> {
    MarkCorrelationState::from_pattern(pattern, grid)?.curve()
}
