//! Error types for pattern estimation, energy evaluation and reconstruction

use std::fmt;
use std::path::PathBuf;

/// Main error type for all reconstruction operations
#[derive(Debug)]
pub enum AlgorithmError {
    /// Input has the wrong shape for the requested operation
    ///
    /// Raised when, for example, a marked operation receives a pattern
    /// without marks or with marks of the wrong kind.
    UnexpectedInput {
        /// Description of the input the operation requires
        expected: &'static str,
        /// Description of the input that was supplied
        found: String,
    },

    /// Energy weights are negative, non-finite, or do not sum into (0, 1]
    InvalidWeight {
        /// The rejected weight vector
        weights: Vec<f64>,
        /// Explanation of why the weights are invalid
        reason: String,
    },

    /// Pattern is too degenerate for summary statistic estimation
    InvalidPattern {
        /// Number of points in the offending pattern
        point_count: usize,
        /// Description of what's wrong with the pattern
        reason: String,
    },

    /// Reconstruction result carries no observed pattern
    MissingObservedPattern,

    /// Summary curves computed with different corrections were compared
    ModeMismatch {
        /// Correction tag of the observed curve
        observed: &'static str,
        /// Correction tag of the candidate curve
        candidate: &'static str,
    },

    /// Observed pattern has no points to reconstruct
    EmptyPattern,

    /// Window cannot hold the requested point count at finite density
    WindowMismatch {
        /// Requested number of points
        point_count: usize,
        /// Area of the offending window
        area: f64,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Pattern file content could not be parsed
    PatternParse {
        /// Path of the file being read
        path: PathBuf,
        /// One-based line number of the offending record
        line: usize,
        /// Description of the parse failure
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for AlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedInput { expected, found } => {
                write!(f, "Unexpected input: expected {expected}, found {found}")
            }
            Self::InvalidWeight { weights, reason } => {
                write!(f, "Invalid energy weights {weights:?}: {reason}")
            }
            Self::InvalidPattern {
                point_count,
                reason,
            } => {
                write!(f, "Invalid pattern with {point_count} points: {reason}")
            }
            Self::MissingObservedPattern => {
                write!(f, "Reconstruction result has no observed pattern attached")
            }
            Self::ModeMismatch {
                observed,
                candidate,
            } => {
                write!(
                    f,
                    "Cannot compare summary curves computed with different corrections \
                     (observed: {observed}, candidate: {candidate})"
                )
            }
            Self::EmptyPattern => write!(f, "Observed pattern contains no points"),
            Self::WindowMismatch { point_count, area } => {
                write!(
                    f,
                    "Window of area {area} cannot hold {point_count} points at finite density"
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::PatternParse { path, line, reason } => {
                write!(
                    f,
                    "Failed to parse '{}' at line {line}: {reason}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for AlgorithmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for algorithm results
pub type Result<T> = std::result::Result<T, AlgorithmError>;

impl From<std::io::Error> for AlgorithmError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> AlgorithmError {
    AlgorithmError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> AlgorithmError {
    AlgorithmError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a degenerate pattern error
pub fn invalid_pattern(point_count: usize, reason: &impl ToString) -> AlgorithmError {
    AlgorithmError::InvalidPattern {
        point_count,
        reason: reason.to_string(),
    }
}

/// Attach a path and operation to an I/O error
pub fn file_system_error(
    path: impl Into<PathBuf>,
    operation: &'static str,
    source: std::io::Error,
) -> AlgorithmError {
    AlgorithmError::FileSystem {
        path: path.into(),
        operation,
        source,
    }
}
