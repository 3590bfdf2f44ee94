//! Error types for transform evaluation and construction.

use thiserror::Error;

/// Error type for transform operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The point lies outside the support of the transform.
    #[error("Point {point:?} is outside the transform support")]
    OutOfDomain { point: Vec<f64> },

    /// A stack coordinate selects an element that does not exist.
    #[error("Stack index {index} out of range for {count} elements")]
    IndexOutOfRange { index: i64, count: usize },

    /// Dimension mismatch between containers and the transform.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The parameter vector has the wrong length.
    #[error("Parameter count mismatch: expected {expected}, got {actual}")]
    ParameterCountMismatch { expected: usize, actual: usize },

    /// Invalid transform or stack configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No constructor registered under this name.
    #[error("Unknown transform: {0}")]
    UnknownTransform(String),
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

impl TransformError {
    /// Create an out-of-domain error for the given coordinates.
    pub fn out_of_domain(point: &[f64]) -> Self {
        Self::OutOfDomain { point: point.to_vec() }
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// True for failures that only concern the evaluated point.
    ///
    /// Callers that integrate over many points skip such points instead of
    /// aborting.
    pub fn is_domain_failure(&self) -> bool {
        matches!(self, Self::OutOfDomain { .. } | Self::IndexOutOfRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_failures() {
        assert!(TransformError::out_of_domain(&[1.0, 2.0]).is_domain_failure());
        assert!(TransformError::IndexOutOfRange { index: -1, count: 3 }.is_domain_failure());
        assert!(!TransformError::dimension_mismatch("x").is_domain_failure());
        assert!(!TransformError::ParameterCountMismatch { expected: 4, actual: 3 }.is_domain_failure());
    }

    #[test]
    fn test_error_display() {
        let err = TransformError::IndexOutOfRange { index: 5, count: 2 };
        assert_eq!(err.to_string(), "Stack index 5 out of range for 2 elements");

        let err = TransformError::ParameterCountMismatch { expected: 8, actual: 4 };
        assert!(err.to_string().contains("expected 8"));
    }
}
