//! Spatial primitives
//!
//! This module contains the geometry the estimators work on:
//! - Points and marks
//! - Observation windows with edge-correction queries
//! - Point patterns bound to a window
//! - Habitat rasters for translation null models

/// Immutable point patterns with cached intensity
pub mod pattern;
/// Point coordinates and numeric or categorical marks
pub mod point;
/// Class rasters over a rectangular extent
pub mod raster;
/// Rectangular and polygonal observation windows
pub mod window;

pub use pattern::Pattern;
pub use point::{Marks, Point};
pub use raster::Raster;
pub use window::{Polygon, Rectangle, Window};
