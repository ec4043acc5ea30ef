/// Command-line interface
pub mod cli;
/// Algorithm constants and defaults
pub mod configuration;
/// Error types
pub mod error;
/// Pattern file reading and result export
pub mod pattern_file;
/// Progress reporting for reconstruction campaigns
pub mod progress;
