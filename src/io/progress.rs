//! Progress reporting for batches of independent reconstructions
//!
//! Computation reports through the [`ProgressObserver`] trait and never waits
//! on it; whether anything is displayed does not affect results.

use crate::io::configuration::{
    MAX_INDIVIDUAL_PROGRESS_BARS, PROGRESS_REFRESH_INTERVAL, RANDOMIZED_NAME_PREFIX,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex};

/// Receiver of advisory progress events from concurrently running units of work
pub trait ProgressObserver: Send + Sync {
    /// A unit (one reconstruction or energy evaluation) started
    fn unit_started(&self, _unit: usize, _iterations: usize) {}

    /// A unit reached the given iteration
    fn iteration(&self, _unit: usize, _iteration: usize) {}

    /// A unit finished; `completed` counts finished units so far and only increases
    fn unit_completed(&self, unit: usize, completed: usize, total: usize);

    /// All units are done
    fn finish(&self) {}
}

/// Observer that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn unit_completed(&self, _unit: usize, _completed: usize, _total: usize) {}
}

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:30.cyan/blue}] {prefix}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Reconstructions: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

/// Progress of one unit, written lock-free by the unit's worker
#[derive(Default)]
struct UnitState {
    /// Start order (1-based), 0 while not started
    started_at: AtomicUsize,
    current: AtomicUsize,
    max: AtomicUsize,
    completed: AtomicBool,
}

/// Terminal progress display
///
/// Shows one iteration bar per running unit for small batches, keeping the
/// most recently started units visible, plus a completed-units bar once the
/// batch is larger than the number of individual bars. Events only update
/// atomics; bars are redrawn by whichever worker finds the display free.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    unit_bars: Vec<ProgressBar>,
    units: Vec<UnitState>,
    started: AtomicUsize,
    redraw: Mutex<()>,
}

impl ProgressManager {
    /// Create progress bars for `total_units` units of work
    pub fn new(total_units: usize) -> Self {
        let multi_progress = MultiProgress::new();

        // Switch to batch mode for large batches to avoid terminal spam
        let batch_bar = (total_units > MAX_INDIVIDUAL_PROGRESS_BARS + 1).then(|| {
            let bar = ProgressBar::new(total_units as u64);
            bar.set_style(BATCH_STYLE.clone());
            multi_progress.add(bar)
        });

        let unit_bars = (0..total_units.min(MAX_INDIVIDUAL_PROGRESS_BARS))
            .map(|_| {
                let bar = ProgressBar::new(0);
                bar.set_style(PROGRESS_STYLE.clone());
                multi_progress.add(bar)
            })
            .collect();

        Self {
            multi_progress,
            batch_bar,
            unit_bars,
            units: (0..total_units).map(|_| UnitState::default()).collect(),
            started: AtomicUsize::new(0),
            redraw: Mutex::new(()),
        }
    }

    /// Latest reported `(iteration, max_iterations)` of a started unit
    pub fn unit_position(&self, unit: usize) -> Option<(usize, usize)> {
        let state = self.units.get(unit)?;
        (state.started_at.load(Ordering::Relaxed) > 0).then(|| {
            (
                state.current.load(Ordering::Relaxed),
                state.max.load(Ordering::Relaxed),
            )
        })
    }

    fn mark_started(&self, state: &UnitState) {
        if state.started_at.load(Ordering::Relaxed) == 0 {
            let order = self.started.fetch_add(1, Ordering::Relaxed) + 1;
            state.started_at.store(order, Ordering::Relaxed);
        }
    }

    /// Show the last N started units, skipping the redraw if another worker holds the display
    fn update_bars(&self) {
        let Ok(_guard) = self.redraw.try_lock() else {
            return;
        };

        let mut active: Vec<(usize, usize)> = self
            .units
            .iter()
            .enumerate()
            .map(|(unit, state)| (state.started_at.load(Ordering::Relaxed), unit))
            .filter(|&(order, _)| order > 0)
            .collect();
        active.sort_unstable();
        let start = active.len().saturating_sub(MAX_INDIVIDUAL_PROGRESS_BARS);
        let visible = active.get(start..).unwrap_or(&[]);

        for (bar, &(_, unit)) in self.unit_bars.iter().zip(visible) {
            let Some(state) = self.units.get(unit) else {
                continue;
            };
            let max = state.max.load(Ordering::Relaxed);
            let current = state.current.load(Ordering::Relaxed).min(max);
            let mark = if state.completed.load(Ordering::Relaxed) {
                "✓ "
            } else {
                ""
            };
            bar.set_length(max as u64);
            bar.set_position(current as u64);
            let max_width = max.to_string().len();
            bar.set_message(format!("{current:>max_width$}/{max}"));
            bar.set_prefix(format!("{mark}{RANDOMIZED_NAME_PREFIX}{}", unit + 1));
        }

        for bar in self.unit_bars.iter().skip(visible.len()) {
            bar.set_length(0);
            bar.set_position(0);
            bar.set_message(String::new());
            bar.set_prefix(String::new());
        }
    }
}

impl ProgressObserver for ProgressManager {
    fn unit_started(&self, unit: usize, iterations: usize) {
        if let Some(state) = self.units.get(unit) {
            state.max.store(iterations, Ordering::Relaxed);
            state.current.store(0, Ordering::Relaxed);
            self.mark_started(state);
        }
        self.update_bars();
    }

    fn iteration(&self, unit: usize, iteration: usize) {
        if let Some(state) = self.units.get(unit) {
            state.current.store(iteration, Ordering::Relaxed);
        }
        if iteration % PROGRESS_REFRESH_INTERVAL != 0 {
            return;
        }
        self.update_bars();
    }

    fn unit_completed(&self, unit: usize, _completed: usize, _total: usize) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
        if let Some(state) = self.units.get(unit) {
            self.mark_started(state);
            state
                .current
                .store(state.max.load(Ordering::Relaxed), Ordering::Relaxed);
            state.completed.store(true, Ordering::Relaxed);
        }
        self.update_bars();
    }

    fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All reconstructions processed");
        }
        let _ = self.multi_progress.clear();
    }
}
