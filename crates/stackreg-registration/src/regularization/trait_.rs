//! Cost function trait definition.
//!
//! This module defines the interface an optimizer uses to evaluate a
//! penalty term, and the normalization applied to sampled sums.

use serde::{Deserialize, Serialize};
use crate::error::Result;

/// Scalar cost over a parameter vector.
///
/// Evaluation pushes `parameters` into the underlying transform, so all
/// methods take `&mut self`.
pub trait CostFunction {
    /// Get the name of this cost function.
    fn name(&self) -> &'static str;

    /// Length of the parameter vectors accepted by the evaluation methods.
    fn number_of_parameters(&self) -> usize;

    /// Cost at `parameters`.
    fn value(&mut self, parameters: &[f64]) -> Result<f64>;

    /// Gradient of the cost at `parameters`, one entry per parameter.
    fn derivative(&mut self, parameters: &[f64]) -> Result<Vec<f64>>;

    /// Cost and gradient in one pass over the samples.
    fn value_and_derivative(&mut self, parameters: &[f64]) -> Result<(f64, Vec<f64>)>;
}

/// Normalization mode for sampled penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationMode {
    /// Raw sum over the valid samples.
    None,
    /// Normalize by the number of valid samples.
    ByCount,
}

impl Default for NormalizationMode {
    fn default() -> Self {
        Self::ByCount
    }
}

impl NormalizationMode {
    /// Divisor applied to value and derivative for `valid` samples.
    pub fn divisor(&self, valid: usize) -> f64 {
        match self {
            Self::None => 1.0,
            Self::ByCount => valid.max(1) as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_mode_default() {
        let mode: NormalizationMode = Default::default();
        assert_eq!(mode, NormalizationMode::ByCount);
    }

    #[test]
    fn test_divisor() {
        assert_eq!(NormalizationMode::ByCount.divisor(4), 4.0);
        assert_eq!(NormalizationMode::ByCount.divisor(0), 1.0);
        assert_eq!(NormalizationMode::None.divisor(4), 1.0);
    }
}
