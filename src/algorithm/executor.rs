use crate::{
    algorithm::acceptance::AcceptanceSchedule,
    algorithm::cache::{UnmarkedStatistics, UpdateStats},
    algorithm::energy::{EnergyWeights, EstimationMode, ObservedSummary, energy, mark_energy},
    algorithm::perturbation::{
        MarkSwap, Relocation, choose_swap, relocate_point, resample_marks, uniform_pattern,
    },
    algorithm::randomization::random_walk_marks,
    algorithm::result::{
        EnergySample, MarkedReconstructionResult, Reconstruction, ReconstructionResult, StopReason,
    },
    analysis::mark_correlation::MarkCorrelationState,
    io::configuration::{
        DEFAULT_FAST_THRESHOLD, DEFAULT_MAX_ITERATIONS, DEFAULT_N_RANDOM,
        DEFAULT_NO_IMPROVEMENT_WINDOW, DEFAULT_RADIUS_SAMPLES, DEFAULT_SEED, DEFAULT_SMOOTHING,
        DEFAULT_WEIGHTS, SEED_STRIDE, STATISTICS_REFRESH_INTERVAL,
    },
    io::error::{AlgorithmError, Result, computation_error, invalid_parameter},
    io::progress::ProgressObserver,
    spatial::pattern::Pattern,
    spatial::window::Window,
};
use log::{debug, info, trace};
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Loop parameters shared by unmarked and marked annealing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnealingSettings {
    /// Upper bound on iterations per run
    pub max_iterations: usize,
    /// Iterations without an accepted strict improvement before stopping
    pub no_improvement_window: usize,
    /// Acceptance rule for non-improving proposals
    pub acceptance: AcceptanceSchedule,
    /// Stop as soon as the energy is at or below this value
    pub energy_threshold: Option<f64>,
    /// Whether to keep the per-iteration energy trajectory
    pub record_trajectory: bool,
}

impl AnnealingSettings {
    fn validate(&self) -> Result<()> {
        if self.no_improvement_window == 0 {
            return Err(invalid_parameter(
                "no_improvement_window",
                &0,
                &"stagnation window must be at least one iteration",
            ));
        }
        if let Some(threshold) = self.energy_threshold
            && !threshold.is_finite()
        {
            return Err(invalid_parameter(
                "energy_threshold",
                &threshold,
                &"must be finite",
            ));
        }
        self.acceptance.validate()
    }
}

/// Parameters of an unmarked reconstruction campaign
#[derive(Clone, Debug)]
pub struct ReconstructionConfig {
    /// Number of independent reconstructions
    pub n_random: usize,
    /// Upper bound on iterations per reconstruction
    pub max_iterations: usize,
    /// Iterations without improvement before a run stops
    pub no_improvement_window: usize,
    /// Exact or fast estimators
    pub mode: EstimationMode,
    /// Point count above which automatic mode switches to fast estimators
    pub fast_threshold: usize,
    /// Weights of the G and g channels
    pub weights: Vec<f64>,
    /// Radii per summary curve
    pub radius_samples: usize,
    /// Smoothing of the fast pair correlation function
    pub smoothing: f64,
    /// Acceptance rule for non-improving proposals
    pub acceptance: AcceptanceSchedule,
    /// Optional early stop once the energy is low enough
    pub energy_threshold: Option<f64>,
    /// Base seed; each run derives its own stream from it
    pub seed: u64,
    /// Whether to keep the per-iteration energy trajectory
    pub record_trajectory: bool,
    /// Window to reconstruct in, defaulting to the observed window
    pub window: Option<Arc<Window>>,
    /// Points per reconstruction, defaulting to the observed count
    pub n_points: Option<usize>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            n_random: DEFAULT_N_RANDOM,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            no_improvement_window: DEFAULT_NO_IMPROVEMENT_WINDOW,
            mode: EstimationMode::Auto,
            fast_threshold: DEFAULT_FAST_THRESHOLD,
            weights: DEFAULT_WEIGHTS.to_vec(),
            radius_samples: DEFAULT_RADIUS_SAMPLES,
            smoothing: DEFAULT_SMOOTHING,
            acceptance: AcceptanceSchedule::default(),
            energy_threshold: None,
            seed: DEFAULT_SEED,
            record_trajectory: true,
            window: None,
            n_points: None,
        }
    }
}

impl ReconstructionConfig {
    /// Configuration with the four core parameters and defaults elsewhere
    pub fn new(
        n_random: usize,
        max_iterations: usize,
        no_improvement_window: usize,
        mode: EstimationMode,
    ) -> Self {
        Self {
            n_random,
            max_iterations,
            no_improvement_window,
            mode,
            ..Self::default()
        }
    }

    /// Loop parameters of every run
    pub const fn annealing_settings(&self) -> AnnealingSettings {
        AnnealingSettings {
            max_iterations: self.max_iterations,
            no_improvement_window: self.no_improvement_window,
            acceptance: self.acceptance,
            energy_threshold: self.energy_threshold,
            record_trajectory: self.record_trajectory,
        }
    }
}

/// How the marks of each marked reconstruction are initialised
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MarkInitialisation {
    /// Draw marks with replacement from the observed marks
    #[default]
    Resample,
    /// Random walk of the observed marks over the observed locations
    RandomWalk {
        /// Number of walk steps
        steps: usize,
    },
}

/// Parameters of a marked reconstruction campaign
#[derive(Clone, Debug)]
pub struct MarkReconstructionConfig {
    /// Number of independent reconstructions
    pub n_random: usize,
    /// Upper bound on iterations per reconstruction
    pub max_iterations: usize,
    /// Iterations without improvement before a run stops
    pub no_improvement_window: usize,
    /// Radii per summary curve
    pub radius_samples: usize,
    /// Acceptance rule for non-improving proposals
    pub acceptance: AcceptanceSchedule,
    /// Optional early stop once the energy is low enough
    pub energy_threshold: Option<f64>,
    /// Base seed; each run derives its own stream from it
    pub seed: u64,
    /// Whether to keep the per-iteration energy trajectory
    pub record_trajectory: bool,
    /// Initial mark assignment
    pub initialisation: MarkInitialisation,
}

impl Default for MarkReconstructionConfig {
    fn default() -> Self {
        Self {
            n_random: DEFAULT_N_RANDOM,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            no_improvement_window: DEFAULT_NO_IMPROVEMENT_WINDOW,
            radius_samples: DEFAULT_RADIUS_SAMPLES,
            acceptance: AcceptanceSchedule::default(),
            energy_threshold: None,
            seed: DEFAULT_SEED,
            record_trajectory: true,
            initialisation: MarkInitialisation::Resample,
        }
    }
}

impl MarkReconstructionConfig {
    /// Configuration with the core parameters and defaults elsewhere
    pub fn new(n_random: usize, max_iterations: usize) -> Self {
        Self {
            n_random,
            max_iterations,
            ..Self::default()
        }
    }

    /// Loop parameters of every run
    pub const fn annealing_settings(&self) -> AnnealingSettings {
        AnnealingSettings {
            max_iterations: self.max_iterations,
            no_improvement_window: self.no_improvement_window,
            acceptance: self.acceptance,
            energy_threshold: self.energy_threshold,
            record_trajectory: self.record_trajectory,
        }
    }
}

/// Seed of the `run_index`-th run of a campaign
pub const fn run_seed(seed: u64, run_index: usize) -> u64 {
    seed ^ (run_index as u64).wrapping_add(1).wrapping_mul(SEED_STRIDE)
}

/// Candidate state the annealing loop optimises
///
/// A proposal stays pending until it is committed or discarded; only one
/// proposal may be pending at a time.
pub trait Candidate {
    /// Draw a perturbation and return the energy the candidate would have after it
    ///
    /// # Errors
    ///
    /// Returns an error if the perturbation or its evaluation fails
    fn propose(&mut self, rng: &mut StdRng) -> Result<f64>;

    /// Make the pending proposal the current state
    ///
    /// # Errors
    ///
    /// Returns an error if no proposal is pending or bookkeeping fails
    fn commit(&mut self) -> Result<()>;

    /// Drop the pending proposal, restoring the current state
    ///
    /// # Errors
    ///
    /// Returns an error if no proposal is pending or bookkeeping fails
    fn discard(&mut self) -> Result<()>;

    /// Energy of the current state
    fn energy(&self) -> f64;

    /// Current pattern
    fn pattern(&self) -> &Pattern;

    /// Consume the candidate, returning its current pattern
    fn into_pattern(self) -> Pattern;
}

fn no_pending_proposal() -> AlgorithmError {
    computation_error("annealing step", &"no proposal is pending")
}

/// Unmarked candidate: point locations move, statistics update incrementally
pub struct UnmarkedCandidate<'a> {
    observed: &'a ObservedSummary,
    weights: &'a EnergyWeights,
    pattern: Pattern,
    statistics: UnmarkedStatistics,
    energy: f64,
    pending: Option<(Pattern, Relocation, f64)>,
    commits_since_refresh: usize,
}

impl<'a> UnmarkedCandidate<'a> {
    /// Wrap an initial pattern and evaluate its energy
    ///
    /// # Errors
    ///
    /// Returns estimation errors for degenerate patterns and energy errors
    /// for mismatched weights
    pub fn new(
        observed: &'a ObservedSummary,
        weights: &'a EnergyWeights,
        pattern: Pattern,
    ) -> Result<Self> {
        let statistics = UnmarkedStatistics::new(
            &pattern,
            observed.grid(),
            observed.is_exact(),
            observed.smoothing(),
        )?;
        let energy = energy(observed.curves(), &statistics.curves(&pattern)?, weights)?;
        Ok(Self {
            observed,
            weights,
            pattern,
            statistics,
            energy,
            pending: None,
            commits_since_refresh: 0,
        })
    }

    /// Incremental and full update counts so far
    pub const fn update_stats(&self) -> UpdateStats {
        self.statistics.stats
    }
}

impl Candidate for UnmarkedCandidate<'_> {
    fn propose(&mut self, rng: &mut StdRng) -> Result<f64> {
        let (next, relocation) = relocate_point(&self.pattern, rng)?;
        self.statistics
            .relocate(&self.pattern, &next, relocation.index)?;
        let proposed = energy(
            self.observed.curves(),
            &self.statistics.curves(&next)?,
            self.weights,
        )?;
        self.pending = Some((next, relocation, proposed));
        Ok(proposed)
    }

    fn commit(&mut self) -> Result<()> {
        let (next, _, proposed) = self.pending.take().ok_or_else(no_pending_proposal)?;
        self.pattern = next;
        self.energy = proposed;
        self.commits_since_refresh += 1;
        if self.commits_since_refresh >= STATISTICS_REFRESH_INTERVAL {
            self.statistics.refresh(&self.pattern)?;
            self.commits_since_refresh = 0;
        }
        Ok(())
    }

    fn discard(&mut self) -> Result<()> {
        let (next, relocation, _) = self.pending.take().ok_or_else(no_pending_proposal)?;
        self.statistics
            .relocate(&next, &self.pattern, relocation.index)
    }

    fn energy(&self) -> f64 {
        self.energy
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn into_pattern(self) -> Pattern {
        self.pattern
    }
}

/// Marked candidate: locations are fixed, marks of two points are exchanged
pub struct MarkedCandidate<'a> {
    observed: &'a ObservedSummary,
    pattern: Pattern,
    state: MarkCorrelationState,
    energy: f64,
    pending: Option<(MarkSwap, f64)>,
}

impl<'a> MarkedCandidate<'a> {
    /// Wrap an initial marked pattern and evaluate its energy
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedInput` for unmarked patterns and estimation errors
    /// for degenerate ones
    pub fn new(observed: &'a ObservedSummary, pattern: Pattern) -> Result<Self> {
        let state = MarkCorrelationState::from_pattern(&pattern, observed.grid())?;
        let energy = Self::energy_of(observed, &state)?;
        Ok(Self {
            observed,
            pattern,
            state,
            energy,
            pending: None,
        })
    }

    fn energy_of(observed: &ObservedSummary, state: &MarkCorrelationState) -> Result<f64> {
        let reference = observed
            .curves()
            .first()
            .ok_or_else(|| computation_error("mark energy", &"no observed curve"))?;
        mark_energy(reference, &state.curve()?)
    }
}

impl Candidate for MarkedCandidate<'_> {
    fn propose(&mut self, rng: &mut StdRng) -> Result<f64> {
        let swap = choose_swap(self.pattern.len(), rng)?;
        self.state.swap(swap.first, swap.second)?;
        let proposed = Self::energy_of(self.observed, &self.state)?;
        self.pending = Some((swap, proposed));
        Ok(proposed)
    }

    fn commit(&mut self) -> Result<()> {
        let (swap, proposed) = self.pending.take().ok_or_else(no_pending_proposal)?;
        self.pattern = self.pattern.with_swapped_marks(swap.first, swap.second)?;
        self.energy = proposed;
        Ok(())
    }

    fn discard(&mut self) -> Result<()> {
        let (swap, _) = self.pending.take().ok_or_else(no_pending_proposal)?;
        self.state.swap(swap.first, swap.second)
    }

    fn energy(&self) -> f64 {
        self.energy
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn into_pattern(self) -> Pattern {
        self.pattern
    }
}

/// One annealing run: propose, evaluate, accept or reject, record, until a stop criterion holds
pub struct AnnealingRun<C> {
    candidate: C,
    rng: StdRng,
    settings: AnnealingSettings,
    /// Completed iterations
    pub iteration: usize,
    since_improvement: usize,
    trajectory: Vec<EnergySample>,
    stop_reason: Option<StopReason>,
}

impl<C: Candidate> AnnealingRun<C> {
    /// Prepare a run from an initial candidate and its random stream
    pub fn new(candidate: C, rng: StdRng, settings: AnnealingSettings) -> Self {
        let capacity = if settings.record_trajectory {
            settings.max_iterations
        } else {
            0
        };
        Self {
            candidate,
            rng,
            settings,
            iteration: 0,
            since_improvement: 0,
            trajectory: Vec::with_capacity(capacity),
            stop_reason: None,
        }
    }

    /// Current candidate
    pub const fn candidate(&self) -> &C {
        &self.candidate
    }

    /// Post-decision energies recorded so far
    pub fn trajectory(&self) -> &[EnergySample] {
        &self.trajectory
    }

    /// Why the run stopped, once it has
    pub const fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    fn termination(&self) -> Option<StopReason> {
        if let Some(threshold) = self.settings.energy_threshold
            && self.candidate.energy() <= threshold
        {
            return Some(StopReason::EnergyThreshold);
        }
        if self.iteration >= self.settings.max_iterations {
            return Some(StopReason::MaxIterations);
        }
        if self.since_improvement >= self.settings.no_improvement_window {
            return Some(StopReason::Stagnation);
        }
        None
    }

    /// Run a single iteration
    ///
    /// Returns `false` without doing anything once a stop criterion holds.
    ///
    /// # Errors
    ///
    /// Returns an error if proposing or evaluating a candidate fails
    pub fn run_iteration(&mut self) -> Result<bool> {
        if self.stop_reason.is_some() {
            return Ok(false);
        }
        if let Some(reason) = self.termination() {
            self.stop_reason = Some(reason);
            return Ok(false);
        }

        self.iteration += 1;
        let current = self.candidate.energy();
        let proposed = self.candidate.propose(&mut self.rng)?;

        if self
            .settings
            .acceptance
            .accept(current, proposed, self.iteration, &mut self.rng)
        {
            self.candidate.commit()?;
            trace!(
                "Iteration {}: accepted energy {proposed:.6} (was {current:.6})",
                self.iteration
            );
            if proposed < current {
                self.since_improvement = 0;
            } else {
                self.since_improvement += 1;
            }
        } else {
            self.candidate.discard()?;
            self.since_improvement += 1;
        }

        if self.settings.record_trajectory {
            self.trajectory.push(EnergySample {
                iteration: self.iteration,
                energy: self.candidate.energy(),
            });
        }
        Ok(true)
    }

    /// Iterate until a stop criterion holds
    ///
    /// # Errors
    ///
    /// Returns the first error of any iteration
    pub fn run(mut self, unit: usize, progress: &dyn ProgressObserver) -> Result<Reconstruction> {
        while self.run_iteration()? {
            progress.iteration(unit, self.iteration);
        }
        let stop_reason = self.stop_reason.or_else(|| self.termination());
        debug!(
            "Run {} stopped after {} iterations at energy {:.6} ({})",
            unit + 1,
            self.iteration,
            self.candidate.energy(),
            stop_reason.map_or_else(|| "unknown".to_string(), |r| r.to_string())
        );
        Ok(Reconstruction {
            pattern: self.candidate.into_pattern(),
            trajectory: self.trajectory,
            stop_reason,
            iterations: self.iteration,
        })
    }
}

/// Validate a caller window and point count, returning the window to use
fn target_window(
    observed: &Pattern,
    config: &ReconstructionConfig,
) -> Result<(Arc<Window>, usize)> {
    let window = config
        .window
        .as_ref()
        .map_or_else(|| Arc::clone(observed.window_arc()), Arc::clone);
    let point_count = config.n_points.unwrap_or_else(|| observed.len());
    let area = window.area();
    let density = point_count as f64 / area;
    if !density.is_finite() || density <= 0.0 {
        return Err(AlgorithmError::WindowMismatch { point_count, area });
    }
    Ok((window, point_count))
}

fn validate_count(n_random: usize) -> Result<()> {
    if n_random == 0 {
        return Err(invalid_parameter(
            "n_random",
            &0,
            &"at least one reconstruction is required",
        ));
    }
    Ok(())
}

/// Reconstruct point patterns that mimic the observed pattern's G(r) and g(r)
///
/// Runs are independent and execute in parallel; each draws from its own
/// random stream derived from the configured seed, so results do not depend
/// on scheduling.
///
/// # Errors
///
/// Returns `EmptyPattern` if the observed pattern has no points,
/// `WindowMismatch` if the target window cannot hold the requested points,
/// `InvalidWeight` for invalid weights, and the first error of any run
pub fn reconstruct(
    observed: &Pattern,
    config: &ReconstructionConfig,
    progress: &dyn ProgressObserver,
) -> Result<ReconstructionResult> {
    if observed.is_empty() {
        return Err(AlgorithmError::EmptyPattern);
    }
    validate_count(config.n_random)?;
    let settings = config.annealing_settings();
    settings.validate()?;
    let weights = EnergyWeights::new(config.weights.clone())?;
    let (window, point_count) = target_window(observed, config)?;

    let exact = config.mode.is_exact(observed.len(), config.fast_threshold);
    let summary =
        ObservedSummary::unmarked(observed, exact, config.radius_samples, config.smoothing)?;
    info!(
        "Reconstructing {} patterns of {point_count} points ({} estimators, r_max {:.4})",
        config.n_random,
        if exact { "exact" } else { "fast" },
        summary.grid().r_max()
    );

    let completed = AtomicUsize::new(0);
    let reconstructions = (0..config.n_random)
        .into_par_iter()
        .map(|unit| {
            let mut rng = StdRng::seed_from_u64(run_seed(config.seed, unit));
            progress.unit_started(unit, config.max_iterations);
            let initial = uniform_pattern(&window, point_count, &mut rng)?;
            let candidate = UnmarkedCandidate::new(&summary, &weights, initial)?;
            let reconstruction = AnnealingRun::new(candidate, rng, settings).run(unit, progress)?;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress.unit_completed(unit, done, config.n_random);
            Ok(reconstruction)
        })
        .collect::<Result<Vec<_>>>();
    progress.finish();

    let reconstructions = reconstructions?;
    info!("Finished {} reconstructions", reconstructions.len());
    Ok(ReconstructionResult::new(observed.clone(), reconstructions))
}

/// Reassign marks over the base pattern's fixed locations to mimic the observed kmm(r)
///
/// # Errors
///
/// Returns `EmptyPattern` if either pattern has no points, `UnexpectedInput`
/// if the observed pattern is unmarked, and the first error of any run
pub fn reconstruct_marks(
    base: &Pattern,
    observed: &Pattern,
    config: &MarkReconstructionConfig,
    progress: &dyn ProgressObserver,
) -> Result<MarkedReconstructionResult> {
    if observed.is_empty() || base.is_empty() {
        return Err(AlgorithmError::EmptyPattern);
    }
    let observed_marks = observed.require_marks()?;
    validate_count(config.n_random)?;
    let settings = config.annealing_settings();
    settings.validate()?;
    if let MarkInitialisation::RandomWalk { .. } = config.initialisation
        && base.len() != observed.len()
    {
        return Err(invalid_parameter(
            "initialisation",
            &"random walk",
            &format!(
                "base pattern has {} points but the observed pattern has {}",
                base.len(),
                observed.len()
            ),
        ));
    }

    let summary = ObservedSummary::marked(observed, config.radius_samples)?;
    let locations = base.unmarked();
    info!(
        "Reconstructing marks of {} patterns of {} points ({})",
        config.n_random,
        base.len(),
        observed_marks.kind_name()
    );

    let completed = AtomicUsize::new(0);
    let reconstructions = (0..config.n_random)
        .into_par_iter()
        .map(|unit| {
            let mut rng = StdRng::seed_from_u64(run_seed(config.seed, unit));
            progress.unit_started(unit, config.max_iterations);
            let marks = match config.initialisation {
                MarkInitialisation::Resample => {
                    resample_marks(observed_marks, locations.len(), &mut rng)?
                }
                MarkInitialisation::RandomWalk { steps } => {
                    random_walk_marks(observed, observed_marks, steps, &mut rng)?
                }
            };
            let initial = locations.clone().with_marks(marks)?;
            let candidate = MarkedCandidate::new(&summary, initial)?;
            let reconstruction = AnnealingRun::new(candidate, rng, settings).run(unit, progress)?;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress.unit_completed(unit, done, config.n_random);
            Ok(reconstruction)
        })
        .collect::<Result<Vec<_>>>();
    progress.finish();

    let reconstructions = reconstructions?;
    info!("Finished {} mark reconstructions", reconstructions.len());
    MarkedReconstructionResult::new(ReconstructionResult::new(observed.clone(), reconstructions))
}
