//! Derivative containers shared by all sparse-derivative transforms.
//!
//! Parameter-dependent derivatives are only stored for the parameters that
//! influence the evaluated point. Each such container travels together with
//! its [`NonZeroIndices`], and entry `p` of the container belongs to
//! parameter `nonzero_indices[p]`.

use nalgebra::{Const, Dyn, OMatrix, SMatrix};

/// Indices into the parameter vector, strictly increasing.
pub type NonZeroIndices = Vec<usize>;

/// dT/dmu restricted to the non-zero parameters: `D x |indices|`.
pub type ParameterJacobian<const D: usize> = OMatrix<f64, Const<D>, Dyn>;

/// dT/dx, row `i` holds the gradient of output component `i`.
pub type SpatialJacobian<const D: usize> = SMatrix<f64, D, D>;

/// d2T/dx2, one symmetric matrix per output component.
pub type SpatialHessian<const D: usize> = [SMatrix<f64, D, D>; D];

/// d/dmu of the spatial Jacobian, one matrix per non-zero parameter.
pub type JacobianOfSpatialJacobian<const D: usize> = Vec<SpatialJacobian<D>>;

/// d/dmu of the spatial Hessian, one Hessian per non-zero parameter.
pub type JacobianOfSpatialHessian<const D: usize> = Vec<SpatialHessian<D>>;

/// Derivative values together with the parameter indices they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct Sparse<T> {
    pub values: T,
    pub nonzero_indices: NonZeroIndices,
}

impl<T> Sparse<T> {
    pub fn new(values: T, nonzero_indices: NonZeroIndices) -> Self {
        Self { values, nonzero_indices }
    }

    /// Number of parameters covered.
    pub fn len(&self) -> usize {
        self.nonzero_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonzero_indices.is_empty()
    }

    /// Transform the values, keeping the index set.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sparse<U> {
        Sparse { values: f(self.values), nonzero_indices: self.nonzero_indices }
    }
}

/// Allocate a zero parameter Jacobian with `columns` columns.
pub fn zero_parameter_jacobian<const D: usize>(columns: usize) -> ParameterJacobian<D> {
    ParameterJacobian::<D>::zeros_generic(Const::<D>, Dyn(columns))
}

/// A spatial Hessian with every component zero.
pub fn zero_spatial_hessian<const D: usize>() -> SpatialHessian<D> {
    [SMatrix::<f64, D, D>::zeros(); D]
}

/// Sum of squared Frobenius norms over all Hessian components.
pub fn hessian_norm_squared<const D: usize>(hessian: &SpatialHessian<D>) -> f64 {
    hessian.iter().map(|h| h.norm_squared()).sum()
}

/// Frobenius inner product summed over all Hessian components.
pub fn hessian_inner_product<const D: usize>(a: &SpatialHessian<D>, b: &SpatialHessian<D>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x.dot(y)).sum()
}

/// True when `indices` is strictly increasing.
pub fn is_strictly_increasing(indices: &[usize]) -> bool {
    indices.windows(2).all(|w| w[0] < w[1])
}
