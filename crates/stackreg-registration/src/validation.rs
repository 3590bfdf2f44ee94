//! Validation utilities for penalty evaluation.
//!
//! This module provides validation functions for parameter vectors and
//! penalty configuration values.

use crate::error::{RegistrationError, Result};

/// Validate a parameter vector before it is pushed into a transform.
pub fn validate_parameters(parameters: &[f64], expected: usize) -> Result<()> {
    if parameters.len() != expected {
        return Err(RegistrationError::dimension_mismatch(format!(
            "expected {} parameters, got {}",
            expected,
            parameters.len()
        )));
    }

    if let Some(position) = parameters.iter().position(|p| !p.is_finite()) {
        return Err(RegistrationError::numerical_instability(format!(
            "parameter {} is not finite: {}",
            position, parameters[position]
        )));
    }

    Ok(())
}

/// Validate the required ratio of valid samples.
pub fn validate_valid_sample_ratio(ratio: f64) -> Result<()> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(RegistrationError::configuration(format!(
            "required ratio of valid samples must lie in (0, 1], got {}",
            ratio
        )));
    }

    Ok(())
}

/// Validate the evaluation chunk size.
pub fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RegistrationError::configuration("Chunk size must be positive"));
    }

    Ok(())
}

/// Validate a per-level sample count.
pub fn validate_sample_count(level: usize, count: usize) -> Result<()> {
    if count == 0 {
        return Err(RegistrationError::configuration(format!(
            "sample count for resolution {} must be positive",
            level
        )));
    }

    Ok(())
}
