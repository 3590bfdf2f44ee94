//! Explicit registry of element transform constructors.
//!
//! Constructors are registered by the caller at start-up and looked up by
//! name when a stack is built from configuration.

use std::collections::HashMap;
use crate::config::ElementSpec;
use crate::error::{Result, TransformError};
use crate::spatial::{Point, Spacing, Vector};
use super::bspline::BSplineTransform;
use super::element::ElementTransform;
use super::translation::TranslationTransform;
use super::trait_::{SparseDerivativeTransform, TransformKind};

/// Builds an element transform from an [`ElementSpec`].
pub type ElementConstructor<const D: usize> = fn(&ElementSpec) -> Result<ElementTransform<D>>;

/// Key of a registered constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformDescriptor {
    pub name: String,
    pub dimension: usize,
}

/// Name-to-constructor mapping for D-dimensional element transforms.
pub struct TransformRegistry<const D: usize> {
    constructors: HashMap<TransformDescriptor, ElementConstructor<D>>,
}

impl<const D: usize> TransformRegistry<D> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { constructors: HashMap::new() }
    }

    /// Registry with the B-Spline and translation constructors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TransformKind::BSpline.name(), build_bspline::<D>);
        registry.register(TransformKind::Translation.name(), build_translation::<D>);
        registry
    }

    /// Register a constructor, returning the one it replaces.
    pub fn register(&mut self, name: impl Into<String>, constructor: ElementConstructor<D>) -> Option<ElementConstructor<D>> {
        let descriptor = TransformDescriptor { name: name.into(), dimension: D };
        self.constructors.insert(descriptor, constructor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&Self::descriptor(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Construct the element described by `spec`.
    pub fn create(&self, spec: &ElementSpec) -> Result<ElementTransform<D>> {
        let constructor = self
            .constructors
            .get(&Self::descriptor(&spec.transform))
            .ok_or_else(|| TransformError::UnknownTransform(format!("{} ({}D)", spec.transform, D)))?;
        constructor(spec)
    }

    fn descriptor(name: &str) -> TransformDescriptor {
        TransformDescriptor { name: name.to_string(), dimension: D }
    }
}

impl<const D: usize> Default for TransformRegistry<D> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn fixed_length<T: Copy, const D: usize>(values: &[T], field: &str) -> Result<[T; D]> {
    values.try_into().map_err(|_| {
        TransformError::dimension_mismatch(format!(
            "{} has {} entries, expected {}",
            field,
            values.len(),
            D
        ))
    })
}

fn build_bspline<const D: usize>(spec: &ElementSpec) -> Result<ElementTransform<D>> {
    let grid_size: [usize; D] = fixed_length(&spec.grid_size, "grid_size")?;
    let grid_origin = Point::new(fixed_length(&spec.grid_origin, "grid_origin")?);
    let grid_spacing = Spacing::new(fixed_length(&spec.grid_spacing, "grid_spacing")?);

    let mut transform = BSplineTransform::new(grid_size, grid_origin, grid_spacing)?;
    if let Some(parameters) = &spec.parameters {
        transform.set_parameters(parameters)?;
    }
    Ok(transform.into())
}

fn build_translation<const D: usize>(spec: &ElementSpec) -> Result<ElementTransform<D>> {
    let mut transform = TranslationTransform::new(Vector::<D>::zeros());
    if let Some(parameters) = &spec.parameters {
        transform.set_parameters(parameters)?;
    }
    Ok(transform.into())
}
