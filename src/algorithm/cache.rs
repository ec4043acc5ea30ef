//! Incrementally maintained summary statistics of an annealing candidate
//!
//! A relocation changes the nearest neighbours of only a few points and the
//! pair sums of only the moved point's pairs, so the candidate's curves are
//! kept up to date without re-evaluating every pair.

use crate::analysis::curve::{RadiusGrid, SummaryCurve};
use crate::analysis::nearest_neighbour::NearestNeighbourState;
use crate::analysis::pair_correlation::{PairCorrelationMethod, PairCorrelationState};
use crate::io::error::Result;
use crate::spatial::pattern::Pattern;

/// Counts of how candidate statistics were brought up to date
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStats {
    /// Number of single-point incremental updates
    pub incremental: usize,
    /// Number of full recomputations
    pub full: usize,
}

/// G(r) and g(r) bookkeeping of an unmarked candidate
#[derive(Debug, Clone)]
pub struct UnmarkedStatistics {
    grid: RadiusGrid,
    method: PairCorrelationMethod,
    exact: bool,
    nearest: NearestNeighbourState,
    pair: PairCorrelationState,

    /// Update statistics
    pub stats: UpdateStats,
}

impl UnmarkedStatistics {
    /// Full computation for a pattern
    ///
    /// # Errors
    ///
    /// Returns estimation errors for degenerate patterns
    pub fn new(pattern: &Pattern, grid: &RadiusGrid, exact: bool, smoothing: f64) -> Result<Self> {
        let method = if exact {
            PairCorrelationMethod::Exact
        } else {
            PairCorrelationMethod::Fast { smoothing }
        };
        Ok(Self {
            grid: grid.clone(),
            method,
            exact,
            nearest: NearestNeighbourState::from_pattern(pattern, grid, exact)?,
            pair: PairCorrelationState::from_pattern(pattern, grid, method)?,
            stats: UpdateStats {
                incremental: 0,
                full: 1,
            },
        })
    }

    /// Absorb the move of the point at `index` from `previous` to `next`
    ///
    /// # Errors
    ///
    /// Returns an error if the patterns do not match the tracked point count
    pub fn relocate(&mut self, previous: &Pattern, next: &Pattern, index: usize) -> Result<()> {
        self.nearest.relocate(next, index)?;
        self.pair.relocate(previous, next, index)?;
        self.stats.incremental += 1;
        Ok(())
    }

    /// Recompute everything from scratch for `pattern`
    ///
    /// # Errors
    ///
    /// Returns estimation errors for degenerate patterns
    pub fn refresh(&mut self, pattern: &Pattern) -> Result<()> {
        self.nearest = NearestNeighbourState::from_pattern(pattern, &self.grid, self.exact)?;
        self.pair = PairCorrelationState::from_pattern(pattern, &self.grid, self.method)?;
        self.stats.full += 1;
        Ok(())
    }

    /// Current G(r) and g(r), in channel order
    ///
    /// # Errors
    ///
    /// Returns an error if the pair correlation curve cannot be smoothed
    pub fn curves(&self, pattern: &Pattern) -> Result<Vec<SummaryCurve>> {
        Ok(vec![self.nearest.curve(pattern)?, self.pair.curve()?])
    }
}
