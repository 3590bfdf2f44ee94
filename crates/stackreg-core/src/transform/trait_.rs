//! Sparse-derivative transform trait.
//!
//! This module defines the capability every transform used by the
//! registration penalties must provide: point mapping plus the parameter
//! and spatial derivatives needed by regularization terms.

use crate::error::Result;
use crate::spatial::Point;
use super::derivative::{
    JacobianOfSpatialHessian, JacobianOfSpatialJacobian, NonZeroIndices, ParameterJacobian,
    Sparse, SpatialHessian, SpatialJacobian,
};

/// Concrete family a transform belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    BSpline,
    Translation,
    Stack,
}

impl TransformKind {
    /// Name used in configuration files and the transform registry.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BSpline => "BSplineTransform",
            Self::Translation => "TranslationTransform",
            Self::Stack => "StackTransform",
        }
    }

    /// Whether the transform has a non-trivial spatial Hessian.
    pub fn is_deformable(&self) -> bool {
        matches!(self, Self::BSpline)
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Transform with sparse parameter derivatives.
///
/// Maps points of a D-dimensional space and evaluates, at a single point,
/// the parameter Jacobian dT/dmu, the spatial Jacobian dT/dx, the spatial
/// Hessian d2T/dx2, and the parameter derivatives of the latter two.
///
/// Parameter derivatives are sparse: they cover only the parameters that
/// influence the point, listed in strictly increasing order. All sparse
/// results for the same point share the same index set, so entries of
/// different derivative families can be aligned positionally.
///
/// Points outside the support of the transform yield
/// [`TransformError::OutOfDomain`](crate::error::TransformError::OutOfDomain)
/// rather than zero derivatives.
///
/// # Type Parameters
/// * `D` - The spatial dimensionality of input and output space
pub trait SparseDerivativeTransform<const D: usize>: Send + Sync {
    /// Family of this transform.
    fn kind(&self) -> TransformKind;

    /// Length of the parameter vector.
    fn number_of_parameters(&self) -> usize;

    /// Current parameter values.
    fn parameters(&self) -> Vec<f64>;

    /// Replace all parameter values.
    fn set_parameters(&mut self, parameters: &[f64]) -> Result<()>;

    /// Upper bound on the size of any non-zero index set.
    fn number_of_nonzero_jacobian_indices(&self) -> usize;

    /// Indices of the parameters that influence `point`.
    fn nonzero_jacobian_indices(&self, point: &Point<D>) -> Result<NonZeroIndices>;

    /// Map a point from input to output space.
    fn transform_point(&self, point: &Point<D>) -> Result<Point<D>>;

    /// Parameter Jacobian dT/dmu at `point`.
    fn jacobian(&self, point: &Point<D>) -> Result<Sparse<ParameterJacobian<D>>>;

    /// Spatial Jacobian dT/dx at `point`.
    fn spatial_jacobian(&self, point: &Point<D>) -> Result<SpatialJacobian<D>>;

    /// Spatial Hessian d2T/dx2 at `point`.
    fn spatial_hessian(&self, point: &Point<D>) -> Result<SpatialHessian<D>>;

    /// Spatial Jacobian together with its parameter derivatives.
    fn spatial_jacobian_and_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<(SpatialJacobian<D>, Sparse<JacobianOfSpatialJacobian<D>>)>;

    /// Spatial Hessian together with its parameter derivatives.
    fn spatial_hessian_and_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<(SpatialHessian<D>, Sparse<JacobianOfSpatialHessian<D>>)>;

    /// Parameter derivatives of the spatial Jacobian.
    fn jacobian_of_spatial_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<Sparse<JacobianOfSpatialJacobian<D>>> {
        self.spatial_jacobian_and_jacobian(point).map(|(_, jsj)| jsj)
    }

    /// Parameter derivatives of the spatial Hessian.
    fn jacobian_of_spatial_hessian(
        &self,
        point: &Point<D>,
    ) -> Result<Sparse<JacobianOfSpatialHessian<D>>> {
        self.spatial_hessian_and_jacobian(point).map(|(_, jsh)| jsh)
    }
}
