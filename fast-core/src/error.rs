//! Error types for the sensitivity engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, FastError>;

/// Errors that can occur while assigning frequencies or computing indices
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FastError {
    /// A parameter has no entry in the reference tables (factor count,
    /// harmonic order or search frequency)
    #[error("Unsupported input: {0}")]
    Domain(String),

    /// The model output carries no variance to attribute
    #[error("Degenerate model output: total variance {total_variance:e} is not positive")]
    DegenerateInput { total_variance: f64 },

    /// Lengths of the supplied series or frequency sets do not line up
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    Shape {
        what: &'static str,
        expected: String,
        actual: usize,
    },
}

impl FastError {
    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        FastError::Domain(msg.into())
    }

    pub(crate) fn shape(what: &'static str, expected: impl ToString, actual: usize) -> Self {
        FastError::Shape {
            what,
            expected: expected.to_string(),
            actual,
        }
    }
}
