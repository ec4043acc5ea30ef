//! Acceptance rules for non-improving proposals

use crate::io::configuration::{DEFAULT_ANNEALING_PROBABILITY, DEFAULT_COOLING_RATE};
use crate::io::error::{Result, invalid_parameter};
use rand::Rng;

/// When a proposal that does not lower the energy is accepted
///
/// Strict improvements are always accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcceptanceSchedule {
    /// Never accept a proposal that does not strictly improve the energy
    Greedy,
    /// Accept with probability `initial_probability · cooling_rate^(k - 1)` at iteration `k`
    Geometric {
        /// Acceptance probability at the first iteration
        initial_probability: f64,
        /// Factor applied to the probability after every iteration
        cooling_rate: f64,
    },
}

impl Default for AcceptanceSchedule {
    fn default() -> Self {
        Self::Geometric {
            initial_probability: DEFAULT_ANNEALING_PROBABILITY,
            cooling_rate: DEFAULT_COOLING_RATE,
        }
    }
}

impl AcceptanceSchedule {
    /// Check the schedule parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the initial probability is outside `[0, 1]` or the
    /// cooling rate is outside `(0, 1]`
    pub fn validate(&self) -> Result<()> {
        if let Self::Geometric {
            initial_probability,
            cooling_rate,
        } = *self
        {
            if !(0.0..=1.0).contains(&initial_probability) {
                return Err(invalid_parameter(
                    "initial_probability",
                    &initial_probability,
                    &"must lie in [0, 1]",
                ));
            }
            if !(cooling_rate > 0.0 && cooling_rate <= 1.0) {
                return Err(invalid_parameter(
                    "cooling_rate",
                    &cooling_rate,
                    &"must lie in (0, 1]",
                ));
            }
        }
        Ok(())
    }

    /// Probability of accepting a non-improving proposal at one-based iteration `iteration`
    pub fn probability(&self, iteration: usize) -> f64 {
        match *self {
            Self::Greedy => 0.0,
            Self::Geometric {
                initial_probability,
                cooling_rate,
            } => {
                let exponent = i32::try_from(iteration.saturating_sub(1)).unwrap_or(i32::MAX);
                initial_probability * cooling_rate.powi(exponent)
            }
        }
    }

    /// Decide whether to move from `current` to `proposed` energy
    pub fn accept<R: Rng + ?Sized>(
        &self,
        current: f64,
        proposed: f64,
        iteration: usize,
        rng: &mut R,
    ) -> bool {
        if proposed < current {
            return true;
        }
        let probability = self.probability(iteration);
        probability > 0.0 && rng.random::<f64>() < probability
    }
}
