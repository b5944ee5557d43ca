//! Error handling for the biosig pipeline
//!
//! Configuration and data errors are fatal and reported immediately.
//! Numeric degeneracy (zero variance, zero spectral power) is never an
//! error: those cases have defined fallback values at the point of
//! computation and do not surface here.

use std::fmt;

/// Result type alias for biosig operations
pub type SigResult<T> = Result<T, SigError>;

/// Error type for all biosig pipeline operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SigError {
    /// Invalid pipeline configuration: unknown feature or model name,
    /// out-of-range window parameters, empty channel set
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Malformed input data: empty recording, ragged channel lengths,
    /// out-of-bounds channel access
    DataError {
        /// Description of the data problem
        message: String,
    },

    /// Feature vectors of differing lengths were stacked into one matrix
    /// (configuration drift between files)
    ShapeMismatch {
        /// Expected vector length
        expected: usize,
        /// Length actually seen
        actual: usize,
    },

    /// A model search finished without a single usable candidate
    SearchError {
        /// Description of the search failure
        message: String,
    },

    /// Failure writing or reading a persisted artifact or report
    PersistenceError {
        /// Description of the I/O failure
        message: String,
    },
}

impl fmt::Display for SigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigError::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            SigError::DataError { message } => {
                write!(f, "Data error: {}", message)
            }
            SigError::ShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Feature vector length mismatch: expected {}, got {}",
                    expected, actual
                )
            }
            SigError::SearchError { message } => {
                write!(f, "Search error: {}", message)
            }
            SigError::PersistenceError { message } => {
                write!(f, "Persistence error: {}", message)
            }
        }
    }
}

impl std::error::Error for SigError {}

impl SigError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        SigError::ConfigError {
            message: message.into(),
        }
    }

    /// Shorthand for a data error
    pub fn data(message: impl Into<String>) -> Self {
        SigError::DataError {
            message: message.into(),
        }
    }
}
