//! Command-line interface for reconstructing pattern files

use crate::algorithm::acceptance::AcceptanceSchedule;
use crate::algorithm::energy::{EnergyOptions, EstimationMode, calculate_energy};
use crate::algorithm::executor::{
    MarkInitialisation, MarkReconstructionConfig, ReconstructionConfig, reconstruct,
    reconstruct_marks,
};
use crate::algorithm::result::{ReconstructionOutcome, ReconstructionResult};
use crate::io::configuration::{
    DEFAULT_FAST_THRESHOLD, DEFAULT_MAX_ITERATIONS, DEFAULT_N_RANDOM,
    DEFAULT_NO_IMPROVEMENT_WINDOW, DEFAULT_RADIUS_SAMPLES, DEFAULT_SEED, ENERGY_SUFFIX,
    RANDOMIZED_NAME_PREFIX, TRAJECTORY_SUFFIX,
};
use crate::io::error::Result;
use crate::io::pattern_file::{
    parse_window, read_pattern, read_polygon, write_energy_report, write_pattern,
    write_trajectories,
};
use crate::io::progress::{NoProgress, ProgressManager, ProgressObserver};
use crate::spatial::window::Window;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "spatrecon")]
#[command(
    author,
    version,
    about = "Reconstruct spatial point patterns by simulated annealing"
)]
/// Command-line arguments of the reconstruction tool
pub struct Cli {
    /// What to reconstruct
    #[command(subcommand)]
    pub command: Command,

    /// Random seed for reproducible reconstruction
    #[arg(short, long, global = true, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of independent reconstructions
    #[arg(short, long, global = true, default_value_t = DEFAULT_N_RANDOM)]
    pub n_random: usize,

    /// Maximum iterations per reconstruction
    #[arg(short = 'i', long, global = true, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Iterations without improvement before a reconstruction stops
    #[arg(long, global = true, default_value_t = DEFAULT_NO_IMPROVEMENT_WINDOW)]
    pub no_improvement: usize,

    /// Radii sampled on every summary curve
    #[arg(long, global = true, default_value_t = DEFAULT_RADIUS_SAMPLES)]
    pub radius_samples: usize,

    /// Only accept proposals that strictly lower the energy
    #[arg(short, long, global = true)]
    pub greedy: bool,

    /// Stop a reconstruction once its energy is at or below this value
    #[arg(long, global = true)]
    pub energy_threshold: Option<f64>,

    /// Directory for output files, defaulting to the input's directory
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Reconstruction tasks
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconstruct point locations from an unmarked pattern
    Reconstruct(ReconstructArgs),
    /// Reassign marks over fixed locations to mimic a marked pattern
    Marks(MarksArgs),
}

/// Estimator choice on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Exact up to the fast threshold, fast above it
    Auto,
    /// Always use edge-corrected estimators
    Exact,
    /// Always use fast estimators
    Fast,
}

impl From<ModeArg> for EstimationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => Self::Auto,
            ModeArg::Exact => Self::Exact,
            ModeArg::Fast => Self::Fast,
        }
    }
}

/// Arguments of unmarked reconstruction
#[derive(Args, Debug)]
pub struct ReconstructArgs {
    /// Observed pattern file (`x,y` per line)
    #[arg(value_name = "POINTS")]
    pub points: PathBuf,

    /// Rectangular window `xmin,xmax,ymin,ymax`
    #[arg(short, long, conflicts_with = "polygon")]
    pub window: Option<String>,

    /// Polygon window file with one vertex per line
    #[arg(short, long)]
    pub polygon: Option<PathBuf>,

    /// Estimator mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Auto)]
    pub mode: ModeArg,

    /// Point count above which automatic mode uses fast estimators
    #[arg(long, default_value_t = DEFAULT_FAST_THRESHOLD)]
    pub fast_threshold: usize,

    /// Weights of the G and g channels
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,

    /// Points per reconstruction, defaulting to the observed count
    #[arg(long)]
    pub n_points: Option<usize>,
}

/// Arguments of marked reconstruction
#[derive(Args, Debug)]
pub struct MarksArgs {
    /// Pattern file whose locations receive the marks
    #[arg(value_name = "BASE")]
    pub base: PathBuf,

    /// Observed marked pattern file (`x,y,mark` per line)
    #[arg(value_name = "MARKED")]
    pub marked: PathBuf,

    /// Rectangular window `xmin,xmax,ymin,ymax` shared by both patterns
    #[arg(short, long)]
    pub window: Option<String>,

    /// Initialise marks by a random walk of this many steps instead of resampling
    #[arg(long)]
    pub random_walk: Option<usize>,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Log level implied by the quiet and verbose flags
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn acceptance(&self) -> AcceptanceSchedule {
        if self.greedy {
            AcceptanceSchedule::Greedy
        } else {
            AcceptanceSchedule::default()
        }
    }
}

/// Runs the selected command and writes its outputs
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Create a runner for parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if an input cannot be read, reconstruction fails, or
    /// an output cannot be written
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Command::Reconstruct(args) => self.run_reconstruct(args),
            Command::Marks(args) => self.run_marks(args),
        }
    }

    fn progress(&self) -> Box<dyn ProgressObserver> {
        if self.cli.should_show_progress() {
            Box::new(ProgressManager::new(self.cli.n_random))
        } else {
            Box::new(NoProgress)
        }
    }

    fn run_reconstruct(&self, args: &ReconstructArgs) -> Result<()> {
        let window = match (&args.window, &args.polygon) {
            (Some(text), _) => Some(Arc::new(parse_window(text)?)),
            (None, Some(path)) => Some(Arc::new(read_polygon(path)?)),
            (None, None) => None,
        };
        let observed = read_pattern(&args.points, window)?;

        let config = ReconstructionConfig {
            n_random: self.cli.n_random,
            max_iterations: self.cli.max_iterations,
            no_improvement_window: self.cli.no_improvement,
            mode: args.mode.into(),
            fast_threshold: args.fast_threshold,
            radius_samples: self.cli.radius_samples,
            acceptance: self.cli.acceptance(),
            energy_threshold: self.cli.energy_threshold,
            seed: self.cli.seed,
            n_points: args.n_points,
            weights: args
                .weights
                .clone()
                .unwrap_or_else(|| ReconstructionConfig::default().weights),
            ..ReconstructionConfig::default()
        };
        let result = reconstruct(&observed, &config, self.progress().as_ref())?;

        let options = EnergyOptions {
            weights: config.weights.clone(),
            fast_threshold: config.fast_threshold,
            radius_samples: config.radius_samples,
            ..EnergyOptions::default()
        };
        self.write_outputs(&args.points, ReconstructionOutcome::Unmarked(result), &options)
    }

    fn run_marks(&self, args: &MarksArgs) -> Result<()> {
        let window = match &args.window {
            Some(text) => Arc::new(parse_window(text)?),
            None => default_window(&args.marked)?,
        };
        let base = read_pattern(&args.base, Some(Arc::clone(&window)))?;
        let observed = read_pattern(&args.marked, Some(window))?;

        let config = MarkReconstructionConfig {
            n_random: self.cli.n_random,
            max_iterations: self.cli.max_iterations,
            no_improvement_window: self.cli.no_improvement,
            radius_samples: self.cli.radius_samples,
            acceptance: self.cli.acceptance(),
            energy_threshold: self.cli.energy_threshold,
            seed: self.cli.seed,
            initialisation: args
                .random_walk
                .map_or(MarkInitialisation::Resample, |steps| {
                    MarkInitialisation::RandomWalk { steps }
                }),
            ..MarkReconstructionConfig::default()
        };
        let result = reconstruct_marks(&base, &observed, &config, self.progress().as_ref())?;

        let options = EnergyOptions {
            radius_samples: config.radius_samples,
            ..EnergyOptions::default()
        };
        self.write_outputs(&args.marked, ReconstructionOutcome::Marked(result), &options)
    }

    fn write_outputs(
        &self,
        input: &Path,
        outcome: ReconstructionOutcome,
        options: &EnergyOptions,
    ) -> Result<()> {
        let report = calculate_energy(&outcome, options, &NoProgress)?;
        let result: &ReconstructionResult = outcome.result();
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();

        for (k, pattern) in result.patterns().enumerate() {
            let name = format!("{stem}_{RANDOMIZED_NAME_PREFIX}{}.csv", k + 1);
            write_pattern(&self.output_path(input, &name), pattern)?;
        }
        write_trajectories(
            &self.output_path(input, &format!("{stem}{TRAJECTORY_SUFFIX}.csv")),
            result,
        )?;
        write_energy_report(
            &self.output_path(input, &format!("{stem}{ENERGY_SUFFIX}.csv")),
            &report,
        )?;

        log::info!("{result}");
        Ok(())
    }

    fn output_path(&self, input: &Path, file_name: &str) -> PathBuf {
        match (&self.cli.output_dir, input.parent()) {
            (Some(dir), _) => dir.join(file_name),
            (None, Some(parent)) => parent.join(file_name),
            (None, None) => PathBuf::from(file_name),
        }
    }
}

// Bounding box of the points in a pattern file
fn default_window(pattern_path: &Path) -> Result<Arc<Window>> {
    read_pattern(pattern_path, None).map(|pattern| Arc::clone(pattern.window_arc()))
}
