//! Error types for penalty evaluation and sampling.
//!
//! This module provides structured error types for the penalty lifecycle,
//! the samplers and the evaluation kernel.

use stackreg_core::TransformError;
use thiserror::Error;

/// Main error type for registration operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// Missing collaborator or unsupported element transform.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Dimension mismatch.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error raised by a transform.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Error in sample selection.
    #[error("Sampler error: {0}")]
    SamplerError(String),

    /// Not enough samples fall inside the transform support.
    #[error("Too few valid samples: {valid} of {total} (required ratio {required_ratio})")]
    TooFewSamples {
        valid: usize,
        total: usize,
        required_ratio: f64,
    },

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Operation called in the wrong lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Evaluation was cancelled.
    #[error("Evaluation cancelled")]
    Cancelled,
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create a sampler error.
    pub fn sampler(msg: impl Into<String>) -> Self {
        Self::SamplerError(msg.into())
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
