//! Natural cubic splines: interpolating and penalised smoothing fits
//!
//! Both variants solve the Reinsch system `(R + λ QᵀQ) γ = Qᵀy` for the
//! second derivatives `γ` at the interior knots, with the second derivative
//! fixed at zero on both ends. `λ = 0` gives the interpolating spline; a
//! positive `λ` trades fidelity for smoothness. The system is pentadiagonal
//! and symmetric positive definite, so a banded Cholesky factorisation solves
//! it in linear time.

use crate::io::error::AlgorithmError;
use std::error::Error;
use std::fmt;

/// Error type for spline fitting and evaluation
#[derive(Debug, Clone)]
pub struct InterpolationError {
    message: String,
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interpolation error: {}", self.message)
    }
}

impl Error for InterpolationError {}

impl InterpolationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<InterpolationError> for AlgorithmError {
    fn from(err: InterpolationError) -> Self {
        Self::Computation {
            operation: "cubic spline",
            reason: err.message,
        }
    }
}

fn value_at(values: &[f64], index: usize) -> Result<f64, InterpolationError> {
    values
        .get(index)
        .copied()
        .ok_or_else(|| InterpolationError::new("Invalid index"))
}

/// Natural cubic spline through (or near) a set of data points
#[derive(Debug, Clone)]
pub struct Cubic {
    x_values: Vec<f64>,
    /// Spline values at the knots (the data itself when interpolating)
    y_values: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl Cubic {
    /// Interpolating natural spline through every data point
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `x_values` and `y_values` have different lengths
    /// - Fewer than 2 data points are provided
    /// - A value is not finite or the x values are not strictly increasing
    pub fn new(x_values: Vec<f64>, y_values: Vec<f64>) -> Result<Self, InterpolationError> {
        Self::fit(x_values, y_values, 0.0)
    }

    /// Penalised smoothing spline with smoothing parameter `spar`
    ///
    /// The penalty is `λ = ratio · 256^(3·spar − 1)`, where `ratio` balances
    /// the traces of the two halves of the Reinsch system so that `spar` is
    /// independent of the scale of the abscissa. Typical values lie in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Cubic::new`], and an error if `spar` is not finite
    pub fn smoothing(
        x_values: Vec<f64>,
        y_values: Vec<f64>,
        spar: f64,
    ) -> Result<Self, InterpolationError> {
        if !spar.is_finite() {
            return Err(InterpolationError::new(
                "Smoothing parameter must be finite",
            ));
        }
        Self::validate(&x_values, &y_values)?;

        let system = ReinschSystem::new(&x_values)?;
        let ratio = system.trace_ratio();
        let lambda = ratio * 256_f64.powf(3.0f64.mul_add(spar, -1.0));
        Self::fit(x_values, y_values, lambda)
    }

    fn validate(x_values: &[f64], y_values: &[f64]) -> Result<(), InterpolationError> {
        if x_values.len() != y_values.len() {
            return Err(InterpolationError::new(
                "x_values and y_values must have the same length",
            ));
        }
        if x_values.len() < 2 {
            return Err(InterpolationError::new(
                "Need at least 2 points for interpolation",
            ));
        }
        if x_values.iter().chain(y_values).any(|v| !v.is_finite()) {
            return Err(InterpolationError::new("Data values must be finite"));
        }
        if x_values.windows(2).any(|pair| match pair {
            [lo, hi] => hi <= lo,
            _ => false,
        }) {
            return Err(InterpolationError::new(
                "x values must be strictly increasing",
            ));
        }
        Ok(())
    }

    fn fit(
        x_values: Vec<f64>,
        y_values: Vec<f64>,
        lambda: f64,
    ) -> Result<Self, InterpolationError> {
        Self::validate(&x_values, &y_values)?;
        let n = x_values.len();
        if n == 2 {
            return Ok(Self {
                x_values,
                y_values,
                second_derivatives: vec![0.0; 2],
            });
        }

        let system = ReinschSystem::new(&x_values)?;
        let rhs = system.q_transpose_times(&y_values)?;
        let gamma = system.solve(lambda, &rhs)?;

        // Smoothed knot values: f = y - λ Q γ
        let fitted = if lambda > 0.0 {
            let q_gamma = system.q_times(&gamma)?;
            y_values
                .iter()
                .zip(&q_gamma)
                .map(|(y, qg)| lambda.mul_add(-qg, *y))
                .collect()
        } else {
            y_values
        };

        let mut second_derivatives = Vec::with_capacity(n);
        second_derivatives.push(0.0);
        second_derivatives.extend(gamma);
        second_derivatives.push(0.0);

        Ok(Self {
            x_values,
            y_values: fitted,
            second_derivatives,
        })
    }

    /// Index of the left knot of the segment containing `x`, clamped to the data range
    fn segment(&self, x: f64) -> usize {
        let n = self.x_values.len();
        let mut klo = 0;
        let mut khi = n - 1;
        while khi - klo > 1 {
            let k = usize::midpoint(khi, klo);
            if self.x_values.get(k).is_some_and(|&x_k| x_k > x) {
                khi = k;
            } else {
                klo = k;
            }
        }
        klo
    }

    fn segment_values(
        &self,
        klo: usize,
    ) -> Result<(f64, f64, f64, f64, f64, f64), InterpolationError> {
        Ok((
            value_at(&self.x_values, klo)?,
            value_at(&self.x_values, klo + 1)?,
            value_at(&self.y_values, klo)?,
            value_at(&self.y_values, klo + 1)?,
            value_at(&self.second_derivatives, klo)?,
            value_at(&self.second_derivatives, klo + 1)?,
        ))
    }

    /// Evaluate the spline at `x`
    ///
    /// Points outside the data range return the nearest boundary value.
    ///
    /// # Errors
    ///
    /// Returns an error if internal index access fails
    pub fn evaluate(&self, x: f64) -> Result<f64, InterpolationError> {
        let first_x = value_at(&self.x_values, 0)?;
        let last = self.x_values.len() - 1;
        if x <= first_x {
            return value_at(&self.y_values, 0);
        }
        if x >= value_at(&self.x_values, last)? {
            return value_at(&self.y_values, last);
        }

        let (x_lo, x_hi, y_lo, y_hi, sd_lo, sd_hi) = self.segment_values(self.segment(x))?;
        let h = x_hi - x_lo;
        let a = (x_hi - x) / h;
        let b = (x - x_lo) / h;

        Ok(a * y_lo
            + b * y_hi
            + ((a.powi(3) - a) * sd_lo + (b.powi(3) - b) * sd_hi) * h.powi(2) / 6.0)
    }

    /// First derivative of the spline at `x`
    ///
    /// Outside the data range the derivative at the nearest end knot is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if internal index access fails
    pub fn derivative(&self, x: f64) -> Result<f64, InterpolationError> {
        let first_x = value_at(&self.x_values, 0)?;
        let last_x = value_at(&self.x_values, self.x_values.len() - 1)?;
        let x = x.clamp(first_x, last_x);

        let (x_lo, x_hi, y_lo, y_hi, sd_lo, sd_hi) = self.segment_values(self.segment(x))?;
        let h = x_hi - x_lo;
        let a = (x_hi - x) / h;
        let b = (x - x_lo) / h;

        Ok((y_hi - y_lo) / h - (3.0 * a).mul_add(a, -1.0) / 6.0 * h * sd_lo
            + (3.0 * b).mul_add(b, -1.0) / 6.0 * h * sd_hi)
    }

    /// First derivative at every knot
    ///
    /// # Errors
    ///
    /// Returns an error if internal index access fails
    pub fn knot_derivatives(&self) -> Result<Vec<f64>, InterpolationError> {
        self.x_values.iter().map(|&x| self.derivative(x)).collect()
    }

    /// Spline values at the knots
    pub fn fitted_values(&self) -> &[f64] {
        &self.y_values
    }
}

/// Banded pieces of the Reinsch system for a fixed set of knots
///
/// Interior unknown `j` belongs to knot `j + 1`; column `j` of `Q` has
/// non-zero entries in rows `j`, `j + 1`, `j + 2`.
struct ReinschSystem {
    spacing: Vec<f64>,
}

impl ReinschSystem {
    fn new(x_values: &[f64]) -> Result<Self, InterpolationError> {
        let spacing: Vec<f64> = x_values
            .windows(2)
            .map(|pair| match pair {
                [lo, hi] => hi - lo,
                _ => 0.0,
            })
            .collect();
        if spacing.iter().any(|&h| h <= 0.0) {
            return Err(InterpolationError::new(
                "x values must be strictly increasing",
            ));
        }
        Ok(Self { spacing })
    }

    fn unknowns(&self) -> usize {
        self.spacing.len().saturating_sub(1)
    }

    /// Entries of column `j` of `Q`
    fn q_column(&self, j: usize) -> Result<(f64, f64, f64), InterpolationError> {
        let h0 = value_at(&self.spacing, j)?;
        let h1 = value_at(&self.spacing, j + 1)?;
        Ok((1.0 / h0, -1.0 / h0 - 1.0 / h1, 1.0 / h1))
    }

    /// Diagonal and first off-diagonal of `R`
    fn r_entries(&self, j: usize) -> Result<(f64, f64), InterpolationError> {
        let h0 = value_at(&self.spacing, j)?;
        let h1 = value_at(&self.spacing, j + 1)?;
        Ok(((h0 + h1) / 3.0, h1 / 6.0))
    }

    /// Balances the roughness penalty against the data term
    fn trace_ratio(&self) -> f64 {
        let mut trace_r = 0.0;
        let mut trace_qtq = 0.0;
        for j in 0..self.unknowns() {
            if let (Ok((diagonal, _)), Ok((q0, q1, q2))) = (self.r_entries(j), self.q_column(j)) {
                trace_r += diagonal;
                trace_qtq += q2.mul_add(q2, q0.mul_add(q0, q1 * q1));
            }
        }
        if trace_qtq > 0.0 {
            trace_r / trace_qtq
        } else {
            0.0
        }
    }

    fn q_transpose_times(&self, y_values: &[f64]) -> Result<Vec<f64>, InterpolationError> {
        (0..self.unknowns())
            .map(|j| {
                let (q0, q1, q2) = self.q_column(j)?;
                Ok(q2.mul_add(
                    value_at(y_values, j + 2)?,
                    q0.mul_add(value_at(y_values, j)?, q1 * value_at(y_values, j + 1)?),
                ))
            })
            .collect()
    }

    fn q_times(&self, gamma: &[f64]) -> Result<Vec<f64>, InterpolationError> {
        let mut product = vec![0.0; self.spacing.len() + 1];
        for (j, &g) in gamma.iter().enumerate() {
            let (q0, q1, q2) = self.q_column(j)?;
            for (row, q) in [(j, q0), (j + 1, q1), (j + 2, q2)] {
                if let Some(slot) = product.get_mut(row) {
                    *slot = q.mul_add(g, *slot);
                }
            }
        }
        Ok(product)
    }

    /// Solve `(R + λ QᵀQ) γ = rhs` by banded Cholesky factorisation
    fn solve(&self, lambda: f64, rhs: &[f64]) -> Result<Vec<f64>, InterpolationError> {
        let m = self.unknowns();

        // Bands of A: diagonal, first and second super-diagonal
        let mut diagonal = vec![0.0; m];
        let mut first = vec![0.0; m];
        let mut second = vec![0.0; m];
        for j in 0..m {
            let (r_diag, r_off) = self.r_entries(j)?;
            let (a0, a1, a2) = self.q_column(j)?;
            let qtq_diag = a2.mul_add(a2, a0.mul_add(a0, a1 * a1));
            let qtq_first = match self.q_column(j + 1) {
                Ok((b0, b1, _)) => a2.mul_add(b1, a1 * b0),
                Err(_) => 0.0,
            };
            let qtq_second = match self.q_column(j + 2) {
                Ok((c0, _, _)) => a2 * c0,
                Err(_) => 0.0,
            };
            if let Some(slot) = diagonal.get_mut(j) {
                *slot = lambda.mul_add(qtq_diag, r_diag);
            }
            if let Some(slot) = first.get_mut(j) {
                *slot = if j + 1 < m {
                    lambda.mul_add(qtq_first, r_off)
                } else {
                    0.0
                };
            }
            if let Some(slot) = second.get_mut(j) {
                *slot = if j + 2 < m { lambda * qtq_second } else { 0.0 };
            }
        }

        // L has diagonal l0, sub-diagonals l1 (k+1, k) and l2 (k+2, k)
        let mut l0 = vec![0.0; m];
        let mut l1 = vec![0.0; m];
        let mut l2 = vec![0.0; m];
        for k in 0..m {
            let prev_l1 = if k >= 1 { value_at(&l1, k - 1)? } else { 0.0 };
            let prev_l2 = if k >= 2 { value_at(&l2, k - 2)? } else { 0.0 };
            let pivot_sq = value_at(&diagonal, k)? - prev_l1 * prev_l1 - prev_l2 * prev_l2;
            if pivot_sq <= 0.0 || !pivot_sq.is_finite() {
                return Err(InterpolationError::new(
                    "Spline system is not positive definite",
                ));
            }
            let pivot = pivot_sq.sqrt();
            let above_l2 = if k >= 1 { value_at(&l2, k - 1)? } else { 0.0 };
            if let Some(slot) = l0.get_mut(k) {
                *slot = pivot;
            }
            if let Some(slot) = l1.get_mut(k) {
                *slot = above_l2.mul_add(-prev_l1, value_at(&first, k)?) / pivot;
            }
            if let Some(slot) = l2.get_mut(k) {
                *slot = value_at(&second, k)? / pivot;
            }
        }

        // Forward substitution L z = rhs
        let mut z = vec![0.0; m];
        for k in 0..m {
            let mut acc = value_at(rhs, k)?;
            if k >= 1 {
                acc -= value_at(&l1, k - 1)? * value_at(&z, k - 1)?;
            }
            if k >= 2 {
                acc -= value_at(&l2, k - 2)? * value_at(&z, k - 2)?;
            }
            if let Some(slot) = z.get_mut(k) {
                *slot = acc / value_at(&l0, k)?;
            }
        }

        // Back substitution Lᵀ γ = z
        let mut gamma = vec![0.0; m];
        for k in (0..m).rev() {
            let mut acc = value_at(&z, k)?;
            if k + 1 < m {
                acc -= value_at(&l1, k)? * value_at(&gamma, k + 1)?;
            }
            if k + 2 < m {
                acc -= value_at(&l2, k)? * value_at(&gamma, k + 2)?;
            }
            if let Some(slot) = gamma.get_mut(k) {
                *slot = acc / value_at(&l0, k)?;
            }
        }

        Ok(gamma)
    }
}
