//! Core types for slice-stack registration.
//!
//! Provides spatial primitives, the sparse-derivative transform contract,
//! cubic B-Spline and translation element transforms, and the stack
//! transform that applies one element per slice of a volume.

pub mod error;
pub mod spatial;
pub mod transform;
pub mod config;

pub use error::{Result, TransformError};
pub use spatial::{Point, Vector, Spacing};
pub use config::{ElementSpec, StackConfig};
pub use transform::{
    BSplineTransform, ElementTransform, ParameterLayout, SparseDerivativeTransform,
    StackTransform, TransformKind, TransformRegistry, TranslationTransform,
};
