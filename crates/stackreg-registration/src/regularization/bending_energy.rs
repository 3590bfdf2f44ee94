//! Bending energy of a transform evaluated at sample points.
//!
//! The bending energy penalizes second-order spatial derivatives of the
//! transform, encouraging deformations with minimal curvature. At a sample
//! point `x` with spatial Hessian components `H_k`:
//!
//! E(x) = Σ_k ‖H_k(x)‖²_F
//!
//! and, for every parameter `p` the point depends on,
//!
//! ∂E/∂μ_p = 2 Σ_k ⟨H_k, ∂H_k/∂μ_p⟩_F
//!
//! Parameters outside the point's non-zero index set contribute nothing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use rayon::prelude::*;
use stackreg_core::spatial::Point;
use stackreg_core::transform::derivative::{hessian_inner_product, hessian_norm_squared};
use stackreg_core::transform::SparseDerivativeTransform;
use crate::error::{RegistrationError, Result};
use super::trait_::NormalizationMode;

/// Options of one kernel evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationOptions {
    pub normalization: NormalizationMode,
    /// Samples per parallel work item.
    pub chunk_size: usize,
    /// Accumulate the parameter derivative.
    pub with_derivative: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            normalization: NormalizationMode::ByCount,
            chunk_size: 256,
            with_derivative: true,
        }
    }
}

/// Result of one kernel evaluation, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct BendingEnergyEvaluation {
    pub value: f64,
    /// Dense gradient, empty when the derivative was not requested.
    pub derivative: Vec<f64>,
    pub number_of_samples_counted: usize,
    pub number_of_samples_skipped: usize,
}

#[derive(Default)]
struct ChunkResult {
    sum: f64,
    valid: usize,
    skipped: usize,
    /// Partial derivative over the parameters this chunk touches.
    derivative: BTreeMap<usize, f64>,
}

fn evaluate_chunk<T, const D: usize>(
    transform: &T,
    chunk: &[Point<D>],
    with_derivative: bool,
    number_of_parameters: usize,
) -> Result<ChunkResult>
where
    T: SparseDerivativeTransform<D> + ?Sized,
{
    let mut result = ChunkResult::default();
    for point in chunk {
        let evaluated = if with_derivative {
            transform.spatial_hessian_and_jacobian(point).map(|(h, jsh)| (h, Some(jsh)))
        } else {
            transform.spatial_hessian(point).map(|h| (h, None))
        };
        let (hessian, jsh) = match evaluated {
            Ok(evaluated) => evaluated,
            Err(e) if e.is_domain_failure() => {
                result.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        result.valid += 1;
        result.sum += hessian_norm_squared(&hessian);

        if let Some(jsh) = jsh {
            for (&index, dh) in jsh.nonzero_indices.iter().zip(jsh.values.iter()) {
                if index >= number_of_parameters {
                    return Err(RegistrationError::dimension_mismatch(format!(
                        "parameter index {} exceeds the {} transform parameters",
                        index, number_of_parameters
                    )));
                }
                *result.derivative.entry(index).or_insert(0.0) += 2.0 * hessian_inner_product(&hessian, dh);
            }
        }
    }
    Ok(result)
}

/// Evaluate the bending energy of `transform` over `samples`.
///
/// Chunks of `options.chunk_size` samples are evaluated in parallel. Each
/// chunk keeps a partial sum and a partial derivative over the parameters
/// its samples touch; partials are reduced in chunk order, so the result
/// does not depend on the number of threads. Samples outside the transform domain are skipped and excluded
/// from the normalization. `cancel` is checked once per chunk.
pub fn evaluate_bending_energy<T, const D: usize>(
    transform: &T,
    samples: &[Point<D>],
    options: &EvaluationOptions,
    cancel: Option<&AtomicBool>,
) -> Result<BendingEnergyEvaluation>
where
    T: SparseDerivativeTransform<D> + ?Sized,
{
    if options.chunk_size == 0 {
        return Err(RegistrationError::configuration("Chunk size must be positive"));
    }
    let number_of_parameters = transform.number_of_parameters();

    let chunks = samples
        .par_chunks(options.chunk_size)
        .map(|chunk| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(RegistrationError::Cancelled);
            }
            evaluate_chunk(transform, chunk, options.with_derivative, number_of_parameters)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sum = 0.0;
    let mut valid = 0;
    let mut skipped = 0;
    let mut derivative = if options.with_derivative {
        vec![0.0; number_of_parameters]
    } else {
        Vec::new()
    };
    for chunk in chunks {
        sum += chunk.sum;
        valid += chunk.valid;
        skipped += chunk.skipped;
        for (index, partial) in chunk.derivative {
            derivative[index] += partial;
        }
    }

    let divisor = options.normalization.divisor(valid);
    if divisor != 1.0 {
        sum /= divisor;
        derivative.iter_mut().for_each(|d| *d /= divisor);
    }

    Ok(BendingEnergyEvaluation {
        value: sum,
        derivative,
        number_of_samples_counted: valid,
        number_of_samples_skipped: skipped,
    })
}
