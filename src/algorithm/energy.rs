//! Energy: weighted discrepancy between observed and candidate summary curves
//!
//! Unmarked patterns are compared on two channels, G(r) and g(r); marked
//! patterns on the single mark correlation channel. Curves are compared by the
//! mean absolute difference over radii where both are defined, so `NaN`
//! samples are skipped rather than propagated.

use crate::algorithm::result::ReconstructionOutcome;
use crate::analysis::curve::{EstimatorKind, RadiusGrid, SummaryCurve};
use crate::analysis::mark_correlation::mark_correlation;
use crate::analysis::nearest_neighbour::nearest_neighbour_g;
use crate::analysis::pair_correlation::{pair_correlation_exact, pair_correlation_fast};
use crate::io::configuration::{
    DEFAULT_FAST_THRESHOLD, DEFAULT_RADIUS_SAMPLES, DEFAULT_SMOOTHING, DEFAULT_WEIGHTS,
};
use crate::io::error::{AlgorithmError, Result, computation_error, invalid_parameter};
use crate::io::progress::ProgressObserver;
use crate::spatial::pattern::Pattern;
use log::{debug, trace, warn};
use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Choice between exact (edge-corrected) and fast estimators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimationMode {
    /// Exact up to the fast threshold, fast above it
    #[default]
    Auto,
    /// Always use the edge-corrected estimators
    Exact,
    /// Always use the fast estimators
    Fast,
}

impl EstimationMode {
    /// Whether exact estimators are used for an observed pattern of `point_count` points
    ///
    /// In automatic mode a pattern of exactly `fast_threshold` points is still
    /// estimated exactly.
    pub const fn is_exact(self, point_count: usize, fast_threshold: usize) -> bool {
        match self {
            Self::Auto => point_count <= fast_threshold,
            Self::Exact => true,
            Self::Fast => false,
        }
    }
}

/// Validated per-channel energy weights
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyWeights(Vec<f64>);

impl EnergyWeights {
    /// Validate a weight vector
    ///
    /// # Errors
    ///
    /// Returns `InvalidWeight` if the vector is empty, a weight is negative
    /// or not finite, or the weights do not sum into `(0, 1]`
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        let reason = if weights.is_empty() {
            Some("at least one weight is required".to_string())
        } else if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            Some("weights must be finite and non-negative".to_string())
        } else {
            let sum: f64 = weights.iter().sum();
            (sum <= 0.0 || sum > 1.0).then(|| format!("weights sum to {sum}, outside (0, 1]"))
        };

        match reason {
            Some(reason) => Err(AlgorithmError::InvalidWeight { weights, reason }),
            None => Ok(Self(weights)),
        }
    }

    /// Weights in channel order
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for validated weights
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EnergyWeights {
    fn default() -> Self {
        Self(DEFAULT_WEIGHTS.to_vec())
    }
}

/// Mean absolute difference between two curves over radii where both are finite
///
/// A comparison without any finite sample pair contributes zero.
///
/// # Errors
///
/// Returns `UnexpectedInput` if the curves estimate different functions,
/// `ModeMismatch` if they use different corrections, and `InvalidParameter`
/// if they are sampled on grids of different length
pub fn curve_distance(observed: &SummaryCurve, candidate: &SummaryCurve) -> Result<f64> {
    if observed.kind() != candidate.kind() {
        return Err(AlgorithmError::UnexpectedInput {
            expected: observed.kind().symbol(),
            found: format!("{} curve", candidate.kind().symbol()),
        });
    }
    if observed.correction() != candidate.correction() {
        return Err(AlgorithmError::ModeMismatch {
            observed: observed.correction().name(),
            candidate: candidate.correction().name(),
        });
    }
    if observed.len() != candidate.len() {
        return Err(invalid_parameter(
            "candidate",
            &candidate.len(),
            &format!("curve has {} samples, observed has {}", candidate.len(), observed.len()),
        ));
    }

    let (total, count) = observed
        .values()
        .iter()
        .zip(candidate.values())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .fold((0.0, 0_usize), |(total, count), (a, b)| {
            (total + (a - b).abs(), count + 1)
        });

    if count == 0 {
        trace!(
            "No comparable samples between observed and candidate {} curves",
            observed.kind().symbol()
        );
        return Ok(0.0);
    }
    Ok(total / count as f64)
}

/// Weighted sum of per-channel curve distances
///
/// # Errors
///
/// Returns `InvalidWeight` if the number of weights differs from the number
/// of channels, and the errors of [`curve_distance`]
pub fn energy(
    observed: &[SummaryCurve],
    candidate: &[SummaryCurve],
    weights: &EnergyWeights,
) -> Result<f64> {
    if observed.len() != weights.len() || candidate.len() != weights.len() {
        return Err(AlgorithmError::InvalidWeight {
            weights: weights.as_slice().to_vec(),
            reason: format!(
                "{} weights for {} observed and {} candidate channels",
                weights.len(),
                observed.len(),
                candidate.len()
            ),
        });
    }

    observed
        .iter()
        .zip(candidate)
        .zip(weights.as_slice())
        .try_fold(0.0, |acc, ((obs, cand), w)| {
            Ok(w.mul_add(curve_distance(obs, cand)?, acc))
        })
}

/// Energy of a marked candidate: the unweighted mark correlation distance
///
/// # Errors
///
/// Returns the errors of [`curve_distance`]
pub fn mark_energy(observed: &SummaryCurve, candidate: &SummaryCurve) -> Result<f64> {
    curve_distance(observed, candidate)
}

/// G(r) and g(r) of an unmarked pattern, in channel order
///
/// # Errors
///
/// Returns `InvalidPattern` for patterns with fewer than two points, and
/// estimation errors of the pair correlation function
pub fn unmarked_curves(
    pattern: &Pattern,
    grid: &RadiusGrid,
    exact: bool,
    smoothing: f64,
) -> Result<Vec<SummaryCurve>> {
    let nearest = nearest_neighbour_g(pattern, grid, exact)?;
    let pair = if exact {
        pair_correlation_exact(pattern, grid)?
    } else {
        pair_correlation_fast(pattern, grid, smoothing)?
    };
    Ok(vec![nearest, pair])
}

/// Summary curves of an observed pattern, computed once and shared by all candidates
#[derive(Debug, Clone)]
pub struct ObservedSummary {
    grid: RadiusGrid,
    exact: bool,
    smoothing: f64,
    curves: Vec<SummaryCurve>,
}

impl ObservedSummary {
    /// G(r) and g(r) of an unmarked observed pattern on its recommended grid
    ///
    /// # Errors
    ///
    /// Returns estimation errors for degenerate patterns
    pub fn unmarked(
        pattern: &Pattern,
        exact: bool,
        radius_samples: usize,
        smoothing: f64,
    ) -> Result<Self> {
        let grid = RadiusGrid::for_pattern(pattern, radius_samples)?;
        let curves = unmarked_curves(pattern, &grid, exact, smoothing)?;
        let summary = Self {
            grid,
            exact,
            smoothing,
            curves,
        };
        summary.warn_undefined();
        Ok(summary)
    }

    /// kmm(r) of a marked observed pattern on its recommended grid
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedInput` for unmarked patterns and estimation errors
    /// for degenerate patterns
    pub fn marked(pattern: &Pattern, radius_samples: usize) -> Result<Self> {
        let grid = RadiusGrid::for_pattern(pattern, radius_samples)?;
        let curves = vec![mark_correlation(pattern, &grid)?];
        let summary = Self {
            grid,
            exact: true,
            smoothing: DEFAULT_SMOOTHING,
            curves,
        };
        summary.warn_undefined();
        Ok(summary)
    }

    /// Shared radius grid
    pub const fn grid(&self) -> &RadiusGrid {
        &self.grid
    }

    /// Whether the exact estimators were used
    pub const fn is_exact(&self) -> bool {
        self.exact
    }

    /// Smoothing parameter of the fast pair correlation function
    pub const fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Observed curves in channel order
    pub fn curves(&self) -> &[SummaryCurve] {
        &self.curves
    }

    /// Channels whose observed curve has no finite sample and so never contribute energy
    pub fn undefined_channels(&self) -> Vec<EstimatorKind> {
        self.curves
            .iter()
            .filter(|curve| !curve.values().iter().any(|v| v.is_finite()))
            .map(SummaryCurve::kind)
            .collect()
    }

    fn warn_undefined(&self) {
        for kind in self.undefined_channels() {
            warn!(
                "Observed {} curve has no finite samples; its channel contributes no energy",
                kind.symbol()
            );
        }
    }
}

/// Options of a batch energy query
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyOptions {
    /// Channel weights for unmarked results (G, g)
    pub weights: Vec<f64>,
    /// Report only the mean energy
    pub reduce_to_mean: bool,
    /// Point count above which fast estimators are used
    pub fast_threshold: usize,
    /// Radius samples used when energies are recomputed
    pub radius_samples: usize,
    /// Smoothing of the fast pair correlation function when recomputing
    pub smoothing: f64,
}

impl Default for EnergyOptions {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
            reduce_to_mean: false,
            fast_threshold: DEFAULT_FAST_THRESHOLD,
            radius_samples: DEFAULT_RADIUS_SAMPLES,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

/// Energy of one reconstruction under its `randomized_<k>` name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedEnergy {
    /// Reconstruction name
    pub name: String,
    /// Energy against the observed pattern
    pub energy: f64,
}

/// Answer of a batch energy query
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyReport {
    /// One energy per reconstruction, in reconstruction order
    PerReconstruction(Vec<NamedEnergy>),
    /// Arithmetic mean over all reconstructions
    Mean(f64),
}

impl fmt::Display for EnergyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerReconstruction(energies) => {
                for (position, named) in energies.iter().enumerate() {
                    if position > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}: {:.6}", named.name, named.energy)?;
                }
                Ok(())
            }
            Self::Mean(mean) => write!(f, "mean energy: {mean:.6}"),
        }
    }
}

/// Energies of every reconstruction in order
///
/// Reconstructions with a stored trajectory report its last value; the others
/// are recomputed against the observed pattern with the default radius grid.
///
/// # Errors
///
/// Returns `MissingObservedPattern` if the result has no observed pattern,
/// and aborts with the first error of any recomputation
pub fn energy_all(
    outcome: &ReconstructionOutcome,
    weights: &EnergyWeights,
    fast_threshold: usize,
    progress: &dyn ProgressObserver,
) -> Result<Vec<f64>> {
    let options = EnergyOptions {
        fast_threshold,
        ..EnergyOptions::default()
    };
    batch_energies(outcome, weights, &options, progress)
}

/// Energy query over a reconstruction result
///
/// Weights are only validated for unmarked results, which have two channels;
/// marked results always use the single mark correlation channel.
///
/// # Errors
///
/// Returns `MissingObservedPattern` if no observed pattern is attached,
/// `InvalidWeight` for invalid weights, `UnexpectedInput` if a marked result
/// contains unmarked patterns, and the first error of any recomputation
pub fn calculate_energy(
    outcome: &ReconstructionOutcome,
    options: &EnergyOptions,
    progress: &dyn ProgressObserver,
) -> Result<EnergyReport> {
    let result = outcome.result();
    result.require_observed()?;

    let weights = match outcome {
        ReconstructionOutcome::Unmarked(_) => {
            let weights = EnergyWeights::new(options.weights.clone())?;
            if weights.len() != DEFAULT_WEIGHTS.len() {
                return Err(AlgorithmError::InvalidWeight {
                    weights: options.weights.clone(),
                    reason: format!(
                        "{} weights for {} unmarked channels",
                        weights.len(),
                        DEFAULT_WEIGHTS.len()
                    ),
                });
            }
            weights
        }
        ReconstructionOutcome::Marked(_) => EnergyWeights::default(),
    };
    let energies = batch_energies(outcome, &weights, options, progress)?;

    if options.reduce_to_mean {
        let mean = if energies.is_empty() {
            f64::NAN
        } else {
            energies.iter().sum::<f64>() / energies.len() as f64
        };
        return Ok(EnergyReport::Mean(mean));
    }

    Ok(EnergyReport::PerReconstruction(
        result
            .names()
            .into_iter()
            .zip(energies)
            .map(|(name, energy)| NamedEnergy { name, energy })
            .collect(),
    ))
}

fn batch_energies(
    outcome: &ReconstructionOutcome,
    weights: &EnergyWeights,
    options: &EnergyOptions,
    progress: &dyn ProgressObserver,
) -> Result<Vec<f64>> {
    let result = outcome.result();
    let observed = result.require_observed()?;
    let total = result.len();
    let completed = AtomicUsize::new(0);

    // Observed curves are only needed when some reconstruction lacks a trajectory
    let recomputed = result
        .reconstructions()
        .iter()
        .filter(|r| r.final_energy().is_none())
        .count();
    let summary = if recomputed > 0 {
        Some(observed_summary(outcome, observed, options)?)
    } else {
        None
    };

    let energies = result
        .reconstructions()
        .par_iter()
        .enumerate()
        .map(|(unit, reconstruction)| {
            let value = match (reconstruction.final_energy(), &summary) {
                (Some(stored), _) => Ok(stored),
                (None, Some(summary)) => {
                    candidate_energy(outcome, summary, &reconstruction.pattern, weights)
                }
                (None, None) => Err(computation_error(
                    "energy recomputation",
                    &"observed summary curves unavailable",
                )),
            };
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress.unit_completed(unit, done, total);
            value
        })
        .collect::<Result<Vec<f64>>>();
    progress.finish();

    let energies = energies?;
    debug!("Evaluated {} energies ({recomputed} recomputed)", energies.len());
    Ok(energies)
}

fn observed_summary(
    outcome: &ReconstructionOutcome,
    observed: &Pattern,
    options: &EnergyOptions,
) -> Result<ObservedSummary> {
    match outcome {
        ReconstructionOutcome::Unmarked(_) => {
            let exact = EstimationMode::Auto.is_exact(observed.len(), options.fast_threshold);
            ObservedSummary::unmarked(observed, exact, options.radius_samples, options.smoothing)
        }
        ReconstructionOutcome::Marked(_) => {
            ObservedSummary::marked(observed, options.radius_samples)
        }
    }
}

fn candidate_energy(
    outcome: &ReconstructionOutcome,
    summary: &ObservedSummary,
    candidate: &Pattern,
    weights: &EnergyWeights,
) -> Result<f64> {
    match outcome {
        ReconstructionOutcome::Unmarked(_) => {
            let curves = unmarked_curves(
                candidate,
                summary.grid(),
                summary.is_exact(),
                summary.smoothing(),
            )?;
            energy(summary.curves(), &curves, weights)
        }
        ReconstructionOutcome::Marked(_) => {
            let curve = mark_correlation(candidate, summary.grid())?;
            let observed = summary
                .curves()
                .first()
                .ok_or_else(|| computation_error("mark energy", &"no observed curve"))?;
            mark_energy(observed, &curve)
        }
    }
}
