//! Stack element wrapper.

use crate::error::Result;
use crate::spatial::Point;
use super::bspline::BSplineTransform;
use super::derivative::{
    JacobianOfSpatialHessian, JacobianOfSpatialJacobian, NonZeroIndices, ParameterJacobian,
    Sparse, SpatialHessian, SpatialJacobian,
};
use super::translation::TranslationTransform;
use super::trait_::{SparseDerivativeTransform, TransformKind};

/// One slot of a [`StackTransform`](super::StackTransform).
///
/// Owns a D-dimensional transform and forwards every operation to it.
/// Elements are moved into the stack and cannot be cloned, so a stack is
/// always the only owner of its elements.
pub struct ElementTransform<const D: usize> {
    inner: Box<dyn SparseDerivativeTransform<D>>,
}

impl<const D: usize> ElementTransform<D> {
    /// Wrap a concrete transform.
    pub fn new<T: SparseDerivativeTransform<D> + 'static>(transform: T) -> Self {
        Self { inner: Box::new(transform) }
    }

    /// Borrow the wrapped transform.
    pub fn inner(&self) -> &dyn SparseDerivativeTransform<D> {
        self.inner.as_ref()
    }

    /// Unwrap the boxed transform.
    pub fn into_inner(self) -> Box<dyn SparseDerivativeTransform<D>> {
        self.inner
    }
}

impl<const D: usize> std::fmt::Debug for ElementTransform<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementTransform")
            .field("kind", &self.inner.kind())
            .field("parameters", &self.inner.number_of_parameters())
            .finish()
    }
}

impl<const D: usize> From<BSplineTransform<D>> for ElementTransform<D> {
    fn from(transform: BSplineTransform<D>) -> Self {
        Self::new(transform)
    }
}

impl<const D: usize> From<TranslationTransform<D>> for ElementTransform<D> {
    fn from(transform: TranslationTransform<D>) -> Self {
        Self::new(transform)
    }
}

impl<const D: usize> SparseDerivativeTransform<D> for ElementTransform<D> {
    fn kind(&self) -> TransformKind {
        self.inner.kind()
    }

    fn number_of_parameters(&self) -> usize {
        self.inner.number_of_parameters()
    }

    fn parameters(&self) -> Vec<f64> {
        self.inner.parameters()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<()> {
        self.inner.set_parameters(parameters)
    }

    fn number_of_nonzero_jacobian_indices(&self) -> usize {
        self.inner.number_of_nonzero_jacobian_indices()
    }

    fn nonzero_jacobian_indices(&self, point: &Point<D>) -> Result<NonZeroIndices> {
        self.inner.nonzero_jacobian_indices(point)
    }

    fn transform_point(&self, point: &Point<D>) -> Result<Point<D>> {
        self.inner.transform_point(point)
    }

    fn jacobian(&self, point: &Point<D>) -> Result<Sparse<ParameterJacobian<D>>> {
        self.inner.jacobian(point)
    }

    fn spatial_jacobian(&self, point: &Point<D>) -> Result<SpatialJacobian<D>> {
        self.inner.spatial_jacobian(point)
    }

    fn spatial_hessian(&self, point: &Point<D>) -> Result<SpatialHessian<D>> {
        self.inner.spatial_hessian(point)
    }

    fn spatial_jacobian_and_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<(SpatialJacobian<D>, Sparse<JacobianOfSpatialJacobian<D>>)> {
        self.inner.spatial_jacobian_and_jacobian(point)
    }

    fn spatial_hessian_and_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<(SpatialHessian<D>, Sparse<JacobianOfSpatialHessian<D>>)> {
        self.inner.spatial_hessian_and_jacobian(point)
    }
}
