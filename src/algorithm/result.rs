//! Reconstruction results and their energy trajectories

use crate::io::configuration::RANDOMIZED_NAME_PREFIX;
use crate::io::error::{AlgorithmError, Result};
use crate::spatial::pattern::Pattern;
use std::fmt;

/// Energy of the current candidate after one iteration's accept/reject decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    /// One-based iteration number
    pub iteration: usize,
    /// Energy of the current candidate after the iteration
    pub energy: f64,
}

/// Why an annealing run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The iteration limit was reached
    MaxIterations,
    /// No strict improvement was accepted within the stagnation window
    Stagnation,
    /// The energy reached the configured threshold
    EnergyThreshold,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MaxIterations => "maximum iterations reached",
            Self::Stagnation => "no improvement within window",
            Self::EnergyThreshold => "energy threshold reached",
        };
        f.write_str(text)
    }
}

/// One reconstructed pattern with the record of how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// Final candidate pattern
    pub pattern: Pattern,
    /// Post-decision energy of every iteration, empty if not recorded
    pub trajectory: Vec<EnergySample>,
    /// Why the run ended; `None` for externally supplied patterns
    pub stop_reason: Option<StopReason>,
    /// Iterations performed
    pub iterations: usize,
}

impl Reconstruction {
    /// Wrap a pattern that was not produced by annealing
    pub const fn from_pattern(pattern: Pattern) -> Self {
        Self {
            pattern,
            trajectory: Vec::new(),
            stop_reason: None,
            iterations: 0,
        }
    }

    /// Last recorded energy, if a trajectory was stored
    pub fn final_energy(&self) -> Option<f64> {
        self.trajectory.last().map(|sample| sample.energy)
    }
}

/// Observed pattern together with its reconstructions
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionResult {
    observed: Option<Pattern>,
    reconstructions: Vec<Reconstruction>,
}

impl ReconstructionResult {
    /// Result of an annealing campaign
    pub const fn new(observed: Pattern, reconstructions: Vec<Reconstruction>) -> Self {
        Self {
            observed: Some(observed),
            reconstructions,
        }
    }

    /// Result assembled from patterns produced elsewhere, without trajectories
    ///
    /// Energies of such results are always recomputed from scratch.
    pub fn from_patterns(observed: Option<Pattern>, patterns: Vec<Pattern>) -> Self {
        Self {
            observed,
            reconstructions: patterns.into_iter().map(Reconstruction::from_pattern).collect(),
        }
    }

    /// Observed pattern, if attached
    pub const fn observed(&self) -> Option<&Pattern> {
        self.observed.as_ref()
    }

    /// Observed pattern or `MissingObservedPattern`
    ///
    /// # Errors
    ///
    /// Returns an error if no observed pattern is attached
    pub fn require_observed(&self) -> Result<&Pattern> {
        self.observed
            .as_ref()
            .ok_or(AlgorithmError::MissingObservedPattern)
    }

    /// Reconstructions in the order they were requested
    pub fn reconstructions(&self) -> &[Reconstruction] {
        &self.reconstructions
    }

    /// Reconstructed patterns in order
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.reconstructions.iter().map(|r| &r.pattern)
    }

    /// Number of reconstructions
    pub fn len(&self) -> usize {
        self.reconstructions.len()
    }

    /// Whether there are no reconstructions
    pub fn is_empty(&self) -> bool {
        self.reconstructions.is_empty()
    }

    /// Names `randomized_1 .. randomized_N` in reconstruction order
    pub fn names(&self) -> Vec<String> {
        (1..=self.reconstructions.len())
            .map(|k| format!("{RANDOMIZED_NAME_PREFIX}{k}"))
            .collect()
    }
}

impl fmt::Display for ReconstructionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.observed {
            Some(observed) => writeln!(
                f,
                "Observed pattern: {} points, intensity {:.4}",
                observed.len(),
                observed.intensity()
            )?,
            None => writeln!(f, "Observed pattern: none")?,
        }
        write!(f, "Reconstructions: {}", self.reconstructions.len())?;
        for (name, reconstruction) in self.names().iter().zip(&self.reconstructions) {
            write!(f, "\n  {name}: {} points", reconstruction.pattern.len())?;
            if let Some(energy) = reconstruction.final_energy() {
                write!(f, ", energy {energy:.6}")?;
            }
            if let Some(reason) = reconstruction.stop_reason {
                write!(f, " after {} iterations ({reason})", reconstruction.iterations)?;
            }
        }
        Ok(())
    }
}

/// Reconstruction result whose patterns all carry marks at fixed locations
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedReconstructionResult(ReconstructionResult);

impl MarkedReconstructionResult {
    /// Wrap a result whose observed pattern and reconstructions are marked
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedInput` if any attached pattern lacks marks
    pub fn new(result: ReconstructionResult) -> Result<Self> {
        let unmarked = result
            .observed()
            .into_iter()
            .chain(result.patterns())
            .find(|pattern| !pattern.is_marked());
        if let Some(pattern) = unmarked {
            return Err(AlgorithmError::UnexpectedInput {
                expected: "marked patterns",
                found: format!("an unmarked pattern with {} points", pattern.len()),
            });
        }
        Ok(Self(result))
    }

    /// Underlying result
    pub const fn inner(&self) -> &ReconstructionResult {
        &self.0
    }

    /// Unwrap the underlying result
    pub fn into_inner(self) -> ReconstructionResult {
        self.0
    }
}

impl fmt::Display for MarkedReconstructionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Marked {}", self.0)
    }
}

/// Either kind of reconstruction result, dispatched on by the energy evaluator
#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructionOutcome {
    /// Point locations were reconstructed
    Unmarked(ReconstructionResult),
    /// Marks were reconstructed at fixed locations
    Marked(MarkedReconstructionResult),
}

impl ReconstructionOutcome {
    /// Underlying result regardless of kind
    pub const fn result(&self) -> &ReconstructionResult {
        match self {
            Self::Unmarked(result) => result,
            Self::Marked(marked) => marked.inner(),
        }
    }
}

impl From<ReconstructionResult> for ReconstructionOutcome {
    fn from(result: ReconstructionResult) -> Self {
        Self::Unmarked(result)
    }
}

impl From<MarkedReconstructionResult> for ReconstructionOutcome {
    fn from(result: MarkedReconstructionResult) -> Self {
        Self::Marked(result)
    }
}
