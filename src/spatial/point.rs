//! Point coordinates and per-point marks

use std::sync::Arc;

/// Planar point with real-valued coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Displacement vector from this point to another
    pub fn offset_to(&self, other: &Self) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }

    /// Both coordinates are finite
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Marks attached to the points of a pattern, stored column-wise
///
/// A pattern carries either numeric or categorical marks, never a mixture.
/// Categorical marks are stored as codes into a shared level table so that
/// cloning a pattern during optimisation stays cheap.
#[derive(Debug, Clone, PartialEq)]
pub enum Marks {
    /// Real-valued marks (e.g. tree diameters)
    Numeric(Vec<f64>),
    /// Categorical marks (e.g. species)
    Categorical {
        /// Level index of each point
        codes: Vec<u32>,
        /// Level labels indexed by code
        levels: Arc<[String]>,
    },
}

impl Marks {
    /// Build categorical marks from labels, assigning codes in order of first appearance
    pub fn categorical<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut levels: Vec<String> = Vec::new();
        let codes = labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                let position = levels.iter().position(|level| level == label);
                position.unwrap_or_else(|| {
                    levels.push(label.to_string());
                    levels.len() - 1
                }) as u32
            })
            .collect();

        Self::Categorical {
            codes,
            levels: levels.into(),
        }
    }

    /// Number of marks
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Categorical { codes, .. } => codes.len(),
        }
    }

    /// Whether there are no marks
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the mark type for error messages
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric marks",
            Self::Categorical { .. } => "categorical marks",
        }
    }

    /// Human-readable mark of the point at `index`
    pub fn label(&self, index: usize) -> Option<String> {
        match self {
            Self::Numeric(values) => values.get(index).map(ToString::to_string),
            Self::Categorical { codes, levels } => codes
                .get(index)
                .and_then(|&code| levels.get(code as usize))
                .cloned(),
        }
    }

    /// Exchange the marks of two points
    ///
    /// Out-of-range indices leave the marks unchanged.
    pub fn swap(&mut self, first: usize, second: usize) {
        let len = self.len();
        if first >= len || second >= len {
            return;
        }
        match self {
            Self::Numeric(values) => values.swap(first, second),
            Self::Categorical { codes, .. } => codes.swap(first, second),
        }
    }

    /// Marks of the given points, in the given order (indices may repeat)
    pub fn select(&self, indices: &[usize]) -> Self {
        match self {
            Self::Numeric(values) => Self::Numeric(
                indices
                    .iter()
                    .map(|&i| values.get(i).copied().unwrap_or(f64::NAN))
                    .collect(),
            ),
            Self::Categorical { codes, levels } => Self::Categorical {
                codes: indices
                    .iter()
                    .map(|&i| codes.get(i).copied().unwrap_or(0))
                    .collect(),
                levels: Arc::clone(levels),
            },
        }
    }

    /// Test function of the mark correlation: product for numeric marks,
    /// indicator of equal levels for categorical marks
    pub fn pair_term(&self, first: usize, second: usize) -> f64 {
        match self {
            Self::Numeric(values) => {
                values.get(first).copied().unwrap_or(0.0)
                    * values.get(second).copied().unwrap_or(0.0)
            }
            Self::Categorical { codes, .. } => match (codes.get(first), codes.get(second)) {
                (Some(a), Some(b)) if a == b => 1.0,
                _ => 0.0,
            },
        }
    }

    /// Expected value of [`Marks::pair_term`] for independently drawn marks
    ///
    /// Squared mean mark for numeric marks, sum of squared level frequencies
    /// for categorical marks.
    pub fn normaliser(&self) -> f64 {
        let n = self.len();
        if n == 0 {
            return f64::NAN;
        }
        match self {
            Self::Numeric(values) => {
                let mean = values.iter().sum::<f64>() / n as f64;
                mean * mean
            }
            Self::Categorical { codes, levels } => {
                let mut counts = vec![0_usize; levels.len()];
                for &code in codes {
                    if let Some(count) = counts.get_mut(code as usize) {
                        *count += 1;
                    }
                }
                counts
                    .iter()
                    .map(|&count| {
                        let p = count as f64 / n as f64;
                        p * p
                    })
                    .sum()
            }
        }
    }

    /// Every numeric mark is finite and every categorical code has a level
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Numeric(values) => values.iter().all(|v| v.is_finite()),
            Self::Categorical { codes, levels } => {
                codes.iter().all(|&code| (code as usize) < levels.len())
            }
        }
    }
}
