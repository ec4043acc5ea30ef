//! Algorithm constants and runtime configuration defaults

// Summary statistic estimation
/// Number of samples on the radius grid of every summary curve
pub const DEFAULT_RADIUS_SAMPLES: usize = 250;

/// Point count above which the fast estimators are used
pub const DEFAULT_FAST_THRESHOLD: usize = 1000;

/// Smoothing parameter of the spline behind the fast pair correlation function
pub const DEFAULT_SMOOTHING: f64 = 0.5;

/// Kernel half-width coefficient (Stoyan's rule, scaled by `1 / sqrt(intensity)`)
pub const STOYAN_COEFFICIENT: f64 = 0.15;

/// Upper bound on any single edge correction weight
pub const MAX_EDGE_WEIGHT: f64 = 100.0;

// Ripley's rule caps the radius so that roughly this many neighbours fall inside it
/// Expected neighbour count bounding the recommended maximum radius
pub const RIPLEY_NEIGHBOUR_LIMIT: f64 = 1000.0;

/// Pixels per side of the mask used for polygon eroded areas
pub const POLYGON_MASK_RESOLUTION: usize = 128;

// Set covariance is a correlation over all offsets, so it uses a coarser mask
/// Pixels per side of the mask used for polygon set covariance
pub const COVARIANCE_MASK_RESOLUTION: usize = 64;

/// Directions sampled on a circle when computing polygon isotropic weights
pub const ISOTROPIC_ANGLE_SAMPLES: usize = 128;

// Energy evaluation
/// Default weights of the nearest-neighbour and pair correlation channels
pub const DEFAULT_WEIGHTS: [f64; 2] = [0.5, 0.5];

/// Prefix of the names reported for each reconstruction's energy
pub const RANDOMIZED_NAME_PREFIX: &str = "randomized_";

// Annealing defaults
/// Fixed seed for reproducible reconstruction
pub const DEFAULT_SEED: u64 = 42;

/// Default number of independent reconstructions
pub const DEFAULT_N_RANDOM: usize = 1;

/// Default maximum iterations per reconstruction
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Default number of iterations without improvement before stopping
pub const DEFAULT_NO_IMPROVEMENT_WINDOW: usize = 250;

/// Probability of accepting a worse proposal on the first iteration
pub const DEFAULT_ANNEALING_PROBABILITY: f64 = 0.01;

/// Geometric decay applied to the acceptance probability each iteration
pub const DEFAULT_COOLING_RATE: f64 = 0.995;

/// Accepted relocations between full recomputations of a candidate's statistics
pub const STATISTICS_REFRESH_INTERVAL: usize = 1000;

/// Odd 64-bit constant used to decorrelate per-run seeds
pub const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;

/// Iterations between redraws of a unit's progress bar
pub const PROGRESS_REFRESH_INTERVAL: usize = 10;

// Output settings
/// Suffix of the trajectory file written next to the input
pub const TRAJECTORY_SUFFIX: &str = "_trajectory";
/// Suffix of the energy report written next to the input
pub const ENERGY_SUFFIX: &str = "_energy";
