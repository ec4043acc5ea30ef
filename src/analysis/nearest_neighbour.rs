//! Nearest-neighbour distance distribution G(r)
//!
//! The exact estimator applies Hanisch's correction: only points whose nearest
//! neighbour is closer than the window boundary are counted, each weighted by
//! the inverse area of the window eroded by its nearest-neighbour distance.
//! The fast estimator is the plain empirical distribution function.

use crate::analysis::curve::{Correction, EstimatorKind, RadiusGrid, SummaryCurve};
use crate::io::error::{Result, invalid_pattern};
use crate::spatial::pattern::Pattern;
use crate::spatial::point::Point;

/// Nearest-neighbour bookkeeping for a pattern, updatable point by point
#[derive(Debug, Clone)]
pub struct NearestNeighbourState {
    grid: RadiusGrid,
    exact: bool,
    neighbours: Vec<usize>,
    distances: Vec<f64>,
    /// Distance of each point to the window boundary (exact mode only)
    boundary: Vec<f64>,
}

fn nearest_of(points: &[Point], index: usize) -> (usize, f64) {
    let Some(origin) = points.get(index) else {
        return (index, f64::INFINITY);
    };
    points
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != index)
        .map(|(j, p)| (j, origin.distance(p)))
        .fold((index, f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
}

impl NearestNeighbourState {
    /// Compute nearest neighbours of every point
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the pattern has fewer than two points
    pub fn from_pattern(pattern: &Pattern, grid: &RadiusGrid, exact: bool) -> Result<Self> {
        let points = pattern.points();
        if points.len() < 2 {
            return Err(invalid_pattern(
                points.len(),
                &"nearest-neighbour distances need at least two points",
            ));
        }

        let (neighbours, distances) = (0..points.len()).map(|i| nearest_of(points, i)).unzip();
        let boundary = if exact {
            points
                .iter()
                .map(|p| pattern.window().boundary_distance(p))
                .collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            grid: grid.clone(),
            exact,
            neighbours,
            distances,
            boundary,
        })
    }

    /// Update after the point at `index` was moved; `next` is the pattern after the move
    ///
    /// Only points whose nearest neighbour was the moved point and which now
    /// lie further from it are rescanned.
    ///
    /// # Errors
    ///
    /// Returns an error if `next` has a different size or `index` is out of range
    pub fn relocate(&mut self, next: &Pattern, index: usize) -> Result<()> {
        let points = next.points();
        if points.len() != self.distances.len() {
            return Err(invalid_pattern(
                points.len(),
                &format!("state tracks {} points", self.distances.len()),
            ));
        }
        let moved = *points
            .get(index)
            .ok_or_else(|| invalid_pattern(points.len(), &format!("no point at index {index}")))?;

        let mut best = (index, f64::INFINITY);
        let mut rescan = Vec::new();
        for (j, ((point, neighbour), distance)) in points
            .iter()
            .zip(self.neighbours.iter_mut())
            .zip(self.distances.iter_mut())
            .enumerate()
        {
            if j == index {
                continue;
            }
            let d = moved.distance(point);
            if d < best.1 {
                best = (j, d);
            }
            if *neighbour == index {
                if d <= *distance {
                    *distance = d;
                } else {
                    rescan.push(j);
                }
            } else if d < *distance {
                *neighbour = index;
                *distance = d;
            }
        }

        if let (Some(neighbour), Some(distance)) =
            (self.neighbours.get_mut(index), self.distances.get_mut(index))
        {
            *neighbour = best.0;
            *distance = best.1;
        }

        for j in rescan {
            let (neighbour, distance) = nearest_of(points, j);
            if let (Some(slot_n), Some(slot_d)) =
                (self.neighbours.get_mut(j), self.distances.get_mut(j))
            {
                *slot_n = neighbour;
                *slot_d = distance;
            }
        }

        if self.exact
            && let Some(slot) = self.boundary.get_mut(index)
        {
            *slot = next.window().boundary_distance(&moved);
        }
        Ok(())
    }

    /// Nearest-neighbour distance of every point
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Estimate G(r) on the state's radius grid
    ///
    /// `pattern` is the tracked pattern; its window supplies eroded areas in exact mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be assembled
    pub fn curve(&self, pattern: &Pattern) -> Result<SummaryCurve> {
        let (weighted, correction) = if self.exact {
            let window = pattern.window();
            let weighted: Vec<(f64, f64)> = self
                .distances
                .iter()
                .zip(&self.boundary)
                .filter(|&(d, b)| d <= b)
                .filter_map(|(&d, _)| {
                    let eroded = window.eroded_area(d);
                    (eroded > 0.0).then(|| (d, 1.0 / eroded))
                })
                .collect();
            (weighted, Correction::Hanisch)
        } else {
            let weighted: Vec<(f64, f64)> = self.distances.iter().map(|&d| (d, 1.0)).collect();
            (weighted, Correction::None)
        };

        let values = cumulative_fraction(weighted, self.grid.values());
        SummaryCurve::new(
            EstimatorKind::NearestNeighbour,
            correction,
            &self.grid,
            values,
        )
    }
}

/// Weighted fraction of distances at or below each radius; all `NaN` without weight
fn cumulative_fraction(mut weighted: Vec<(f64, f64)>, radii: &[f64]) -> Vec<f64> {
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return vec![f64::NAN; radii.len()];
    }

    weighted.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut remaining = weighted.iter().peekable();
    let mut accumulated = 0.0;
    radii
        .iter()
        .map(|&r| {
            while let Some((_, w)) = remaining.next_if(|(d, _)| *d <= r) {
                accumulated += w;
            }
            accumulated / total
        })
        .collect()
}

/// Estimate the nearest-neighbour distance distribution G(r)
///
/// # Errors
///
/// Returns `InvalidPattern` if the pattern has fewer than two points
pub fn nearest_neighbour_g(
    pattern: &Pattern,
    grid: &RadiusGrid,
    exact: bool,
) -> Result<SummaryCurve> {
    NearestNeighbourState::from_pattern(pattern, grid, exact)?.curve(pattern)
}
