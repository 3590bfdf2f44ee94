//! Transform types and operations.
//!
//! This module provides the sparse-derivative transform contract, the
//! element transforms that implement it, and the stack transform that
//! composes them along the last axis.

pub mod trait_;
pub mod derivative;
pub mod translation;
pub mod bspline;
pub mod element;
pub mod layout;
pub mod stack;
pub mod registry;
pub mod batch;

pub use trait_::{SparseDerivativeTransform, TransformKind};
pub use derivative::{
    JacobianOfSpatialHessian, JacobianOfSpatialJacobian, NonZeroIndices, ParameterJacobian,
    Sparse, SpatialHessian, SpatialJacobian,
};
pub use translation::TranslationTransform;
pub use bspline::BSplineTransform;
pub use element::ElementTransform;
pub use layout::ParameterLayout;
pub use stack::StackTransform;
pub use registry::{ElementConstructor, TransformDescriptor, TransformRegistry};
pub use batch::{points_from_tensor, points_to_tensor, transform_points_tensor};
