//! Reconstruction of spatial point patterns by simulated annealing on summary statistics
//!
//! Synthetic patterns are fitted to an observed pattern by repeatedly relocating
//! points (or swapping marks) and keeping changes that bring the nearest-neighbour
//! distance function, pair correlation function or mark correlation function of
//! the candidate closer to the observed curves.

#![forbid(unsafe_code)]

/// Energy evaluation, proposals and the annealing loop
pub mod algorithm;
/// Summary statistic estimators on radius grids
pub mod analysis;
/// Input/output operations and error handling
pub mod io;
/// Smoothing splines and kernels
pub mod math;
/// Points, windows, patterns and habitat rasters
pub mod spatial;

pub use io::error::{AlgorithmError, Result};
