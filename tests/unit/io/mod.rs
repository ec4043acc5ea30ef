pub mod configuration;
pub mod pattern_file;
