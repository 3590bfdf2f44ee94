//! Translation transform implementation.
//!
//! This module provides a simple translation transform.

use crate::error::{Result, TransformError};
use crate::spatial::{Point, Vector};
use super::derivative::{
    zero_parameter_jacobian, zero_spatial_hessian, JacobianOfSpatialHessian,
    JacobianOfSpatialJacobian, NonZeroIndices, ParameterJacobian, Sparse, SpatialHessian,
    SpatialJacobian,
};
use super::trait_::{SparseDerivativeTransform, TransformKind};

/// Simple Translation Transform.
///
/// Translates points by a fixed offset vector. Defined everywhere, every
/// parameter influences every point, and all second derivatives vanish.
#[derive(Debug)]
pub struct TranslationTransform<const D: usize> {
    translation: Vector<D>,
}

impl<const D: usize> TranslationTransform<D> {
    /// Create a new translation transform.
    pub fn new(translation: Vector<D>) -> Self {
        Self { translation }
    }

    /// Get the translation vector.
    pub fn translation(&self) -> Vector<D> {
        self.translation
    }

    fn all_indices() -> NonZeroIndices {
        (0..D).collect()
    }
}

impl<const D: usize> SparseDerivativeTransform<D> for TranslationTransform<D> {
    fn kind(&self) -> TransformKind {
        TransformKind::Translation
    }

    fn number_of_parameters(&self) -> usize {
        D
    }

    fn parameters(&self) -> Vec<f64> {
        self.translation.to_vec()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<()> {
        self.translation = Vector::from_slice(parameters).ok_or(
            TransformError::ParameterCountMismatch { expected: D, actual: parameters.len() },
        )?;
        Ok(())
    }

    fn number_of_nonzero_jacobian_indices(&self) -> usize {
        D
    }

    fn nonzero_jacobian_indices(&self, _point: &Point<D>) -> Result<NonZeroIndices> {
        Ok(Self::all_indices())
    }

    fn transform_point(&self, point: &Point<D>) -> Result<Point<D>> {
        Ok(*point + self.translation)
    }

    fn jacobian(&self, _point: &Point<D>) -> Result<Sparse<ParameterJacobian<D>>> {
        let mut jacobian = zero_parameter_jacobian::<D>(D);
        jacobian.fill_with_identity();
        Ok(Sparse::new(jacobian, Self::all_indices()))
    }

    fn spatial_jacobian(&self, _point: &Point<D>) -> Result<SpatialJacobian<D>> {
        Ok(SpatialJacobian::<D>::identity())
    }

    fn spatial_hessian(&self, _point: &Point<D>) -> Result<SpatialHessian<D>> {
        Ok(zero_spatial_hessian())
    }

    fn spatial_jacobian_and_jacobian(
        &self,
        _point: &Point<D>,
    ) -> Result<(SpatialJacobian<D>, Sparse<JacobianOfSpatialJacobian<D>>)> {
        Ok((
            SpatialJacobian::<D>::identity(),
            Sparse::new(vec![SpatialJacobian::<D>::zeros(); D], Self::all_indices()),
        ))
    }

    fn spatial_hessian_and_jacobian(
        &self,
        _point: &Point<D>,
    ) -> Result<(SpatialHessian<D>, Sparse<JacobianOfSpatialHessian<D>>)> {
        Ok((
            zero_spatial_hessian(),
            Sparse::new(vec![zero_spatial_hessian(); D], Self::all_indices()),
        ))
    }
}
