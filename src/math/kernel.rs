//! Epanechnikov smoothing kernel used by the pair and mark correlation estimators

use crate::io::configuration::STOYAN_COEFFICIENT;
use crate::io::error::{Result, invalid_parameter};

/// Epanechnikov kernel with compact support `[-h, h]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Epanechnikov {
    half_width: f64,
}

impl Epanechnikov {
    /// Kernel with the given half-width
    ///
    /// # Errors
    ///
    /// Returns an error if the half-width is not strictly positive and finite
    pub fn new(half_width: f64) -> Result<Self> {
        if !half_width.is_finite() || half_width <= 0.0 {
            return Err(invalid_parameter(
                "half_width",
                &half_width,
                &"kernel half-width must be positive and finite",
            ));
        }
        Ok(Self { half_width })
    }

    /// Kernel with Stoyan's bandwidth `0.15 / sqrt(intensity)`
    ///
    /// # Errors
    ///
    /// Returns an error if the intensity is not strictly positive and finite
    pub fn stoyan(intensity: f64) -> Result<Self> {
        if !intensity.is_finite() || intensity <= 0.0 {
            return Err(invalid_parameter(
                "intensity",
                &intensity,
                &"bandwidth rule needs a positive finite intensity",
            ));
        }
        Self::new(STOYAN_COEFFICIENT / intensity.sqrt())
    }

    /// Half-width of the support
    pub const fn half_width(&self) -> f64 {
        self.half_width
    }

    /// Kernel density at offset `u`; integrates to one over the real line
    pub fn density(&self, u: f64) -> f64 {
        let t = u / self.half_width;
        if t.abs() >= 1.0 {
            0.0
        } else {
            0.75 * t.mul_add(-t, 1.0) / self.half_width
        }
    }
}
