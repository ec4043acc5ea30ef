//! Summary-statistic estimators for point patterns
//!
//! Every estimator has a full form (one call on a pattern) and an incremental
//! state that can absorb a single perturbation cheaply. Both share the same
//! accumulators, so their results agree up to rounding.

/// Radius grids and sampled summary curves
pub mod curve;
/// Mark correlation function kmm(r)
pub mod mark_correlation;
/// Nearest-neighbour distance distribution G(r)
pub mod nearest_neighbour;
/// Pair correlation function g(r)
pub mod pair_correlation;

pub use curve::{Correction, EstimatorKind, RadiusGrid, SummaryCurve};
pub use mark_correlation::{MarkCorrelationState, mark_correlation};
pub use nearest_neighbour::{NearestNeighbourState, nearest_neighbour_g};
pub use pair_correlation::{
    PairCorrelationMethod, PairCorrelationState, estimate_pcf_fast, pair_correlation_exact,
    pair_correlation_fast,
};
