//! Mathematical utilities for the estimators

/// Natural cubic splines for smoothing and differentiating sampled curves
pub mod interpolation;
/// Smoothing kernels and bandwidth rules
pub mod kernel;
