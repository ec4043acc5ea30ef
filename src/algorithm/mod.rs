//! Reconstruction engine: energy evaluation, proposals and the annealing loop

/// Acceptance schedules for non-improving proposals
pub mod acceptance;
/// Incrementally maintained candidate statistics
pub mod cache;
/// Energy of candidate patterns against an observed pattern
pub mod energy;
/// Annealing runs and reconstruction campaigns
pub mod executor;
/// Point relocation, mark swaps and initial patterns
pub mod perturbation;
/// Torus translations and mark random walks for null models
pub mod randomization;
/// Reconstruction results, trajectories and stop reasons
pub mod result;
