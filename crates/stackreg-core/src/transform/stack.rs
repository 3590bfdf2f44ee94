//! Stack transform implementation.
//!
//! A stack transform composes independent R-dimensional transforms, one per
//! slice of a D = R + 1 dimensional volume. The last coordinate of a point
//! selects the slice; the other coordinates are mapped by that slice's
//! transform and the last coordinate is passed through unchanged.

use nalgebra::SMatrix;
use crate::config::StackConfig;
use crate::error::{Result, TransformError};
use crate::spatial::Point;
use super::derivative::{
    zero_parameter_jacobian, zero_spatial_hessian, JacobianOfSpatialHessian,
    JacobianOfSpatialJacobian, NonZeroIndices, ParameterJacobian, Sparse, SpatialHessian,
    SpatialJacobian,
};
use super::element::ElementTransform;
use super::layout::ParameterLayout;
use super::registry::TransformRegistry;
use super::trait_::{SparseDerivativeTransform, TransformKind};

/// Stack of element transforms sharing one stacked parameter vector.
///
/// The parameter vector is the concatenation of the element parameter
/// vectors in stack order. Derivatives returned by the stack carry global
/// (stacked) parameter indices.
///
/// # Type Parameters
/// * `D` - Dimensionality of the stacked volume
/// * `R` - Dimensionality of each element, must equal `D - 1`
#[derive(Debug)]
pub struct StackTransform<const D: usize, const R: usize> {
    elements: Vec<ElementTransform<R>>,
    layout: ParameterLayout,
    stack_origin: f64,
    stack_spacing: f64,
}

impl<const D: usize, const R: usize> StackTransform<D, R> {
    /// Create a stack from its elements.
    ///
    /// # Arguments
    /// * `elements` - Element transforms in stack order
    /// * `stack_origin` - Last coordinate of element 0
    /// * `stack_spacing` - Distance along the last axis between elements
    pub fn new(elements: Vec<ElementTransform<R>>, stack_origin: f64, stack_spacing: f64) -> Result<Self> {
        if R + 1 != D {
            return Err(TransformError::dimension_mismatch(format!(
                "stack of dimension {} needs elements of dimension {}, got {}",
                D,
                D.saturating_sub(1),
                R
            )));
        }
        if elements.is_empty() {
            return Err(TransformError::invalid_configuration("stack has no elements"));
        }
        if !stack_origin.is_finite() || !stack_spacing.is_finite() || stack_spacing <= 0.0 {
            return Err(TransformError::invalid_configuration(format!(
                "invalid stack geometry: origin {}, spacing {}",
                stack_origin, stack_spacing
            )));
        }

        let layout = Self::build_layout(&elements);
        tracing::debug!(
            "Created stack of {} elements with {} parameters",
            elements.len(),
            layout.total()
        );

        Ok(Self { elements, layout, stack_origin, stack_spacing })
    }

    /// Build a stack from a configuration using the registered constructors.
    ///
    /// A declared `number_of_parameters` must match the sum of the element
    /// parameter counts.
    pub fn from_config(config: &StackConfig, registry: &TransformRegistry<R>) -> Result<Self> {
        let elements = config
            .elements
            .iter()
            .map(|spec| registry.create(spec))
            .collect::<Result<Vec<_>>>()?;
        let stack = Self::new(elements, config.stack_origin, config.stack_spacing)?;
        if let Some(declared) = config.number_of_parameters {
            stack.layout.validate(declared)?;
        }
        Ok(stack)
    }

    fn build_layout(elements: &[ElementTransform<R>]) -> ParameterLayout {
        ParameterLayout::new(elements.iter().map(|e| e.number_of_parameters()).collect())
    }

    pub fn number_of_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, index: usize) -> Option<&ElementTransform<R>> {
        self.elements.get(index)
    }

    pub fn elements(&self) -> &[ElementTransform<R>] {
        &self.elements
    }

    /// Cached partition of the stacked parameter vector.
    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn stack_origin(&self) -> f64 {
        self.stack_origin
    }

    pub fn stack_spacing(&self) -> f64 {
        self.stack_spacing
    }

    /// Replace one element and rebuild the parameter layout.
    ///
    /// Returns the element that was replaced.
    pub fn replace_element(&mut self, index: usize, element: ElementTransform<R>) -> Result<ElementTransform<R>> {
        if index >= self.elements.len() {
            return Err(TransformError::IndexOutOfRange {
                index: index as i64,
                count: self.elements.len(),
            });
        }
        let previous = std::mem::replace(&mut self.elements[index], element);
        self.layout = Self::build_layout(&self.elements);
        Ok(previous)
    }

    /// Element selected by a last-axis coordinate.
    ///
    /// The continuous stack index is rounded half up, so a coordinate exactly
    /// between two elements belongs to the upper one.
    pub fn element_index(&self, coordinate: f64) -> Result<usize> {
        let count = self.elements.len();
        let position = ((coordinate - self.stack_origin) / self.stack_spacing + 0.5).floor();
        if !position.is_finite() {
            return Err(TransformError::IndexOutOfRange { index: i64::MIN, count });
        }
        if position < 0.0 || position >= count as f64 {
            return Err(TransformError::IndexOutOfRange { index: position as i64, count });
        }
        Ok(position as usize)
    }

    /// Owning element and the reduced point forwarded to it.
    pub fn locate(&self, point: &Point<D>) -> Result<(usize, Point<R>)> {
        let element = self.element_index(point.last())?;
        Ok((element, point.leading::<R>()))
    }

    fn embed_matrix(m: &SMatrix<f64, R, R>) -> SMatrix<f64, D, D> {
        SMatrix::<f64, D, D>::from_fn(|i, j| if i < R && j < R { m[(i, j)] } else { 0.0 })
    }

    fn embed_hessian(h: &SpatialHessian<R>) -> SpatialHessian<D> {
        let mut embedded = zero_spatial_hessian::<D>();
        for (k, component) in h.iter().enumerate() {
            embedded[k] = Self::embed_matrix(component);
        }
        embedded
    }

    /// The last output coordinate equals the last input coordinate.
    fn embed_spatial_jacobian(sj: &SpatialJacobian<R>) -> SpatialJacobian<D> {
        let mut embedded = Self::embed_matrix(sj);
        embedded[(R, R)] = 1.0;
        embedded
    }

    fn globalize<T>(&self, element: usize, sparse: Sparse<T>) -> Result<Sparse<T>> {
        let nonzero_indices = self.layout.to_global(element, sparse.nonzero_indices)?;
        Ok(Sparse::new(sparse.values, nonzero_indices))
    }
}

impl<const D: usize, const R: usize> SparseDerivativeTransform<D> for StackTransform<D, R> {
    fn kind(&self) -> TransformKind {
        TransformKind::Stack
    }

    fn number_of_parameters(&self) -> usize {
        self.layout.total()
    }

    fn parameters(&self) -> Vec<f64> {
        let parts: Vec<Vec<f64>> = self.elements.iter().map(|e| e.parameters()).collect();
        parts.concat()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<()> {
        let parts = self.layout.split(parameters)?;
        for (element, part) in self.elements.iter_mut().zip(parts) {
            element.set_parameters(part)?;
        }
        Ok(())
    }

    fn number_of_nonzero_jacobian_indices(&self) -> usize {
        self.elements
            .iter()
            .map(|e| e.number_of_nonzero_jacobian_indices())
            .max()
            .unwrap_or(0)
    }

    fn nonzero_jacobian_indices(&self, point: &Point<D>) -> Result<NonZeroIndices> {
        let (element, reduced) = self.locate(point)?;
        let local = self.elements[element].nonzero_jacobian_indices(&reduced)?;
        self.layout.to_global(element, local)
    }

    fn transform_point(&self, point: &Point<D>) -> Result<Point<D>> {
        let (element, reduced) = self.locate(point)?;
        let mapped = self.elements[element].transform_point(&reduced)?;
        Ok(point.with_leading(&mapped))
    }

    fn jacobian(&self, point: &Point<D>) -> Result<Sparse<ParameterJacobian<D>>> {
        let (element, reduced) = self.locate(point)?;
        let local = self.elements[element].jacobian(&reduced)?;
        let embedded = local.map(|j| {
            let mut full = zero_parameter_jacobian::<D>(j.ncols());
            full.fixed_rows_mut::<R>(0).copy_from(&j);
            full
        });
        self.globalize(element, embedded)
    }

    fn spatial_jacobian(&self, point: &Point<D>) -> Result<SpatialJacobian<D>> {
        let (element, reduced) = self.locate(point)?;
        let sj = self.elements[element].spatial_jacobian(&reduced)?;
        Ok(Self::embed_spatial_jacobian(&sj))
    }

    fn spatial_hessian(&self, point: &Point<D>) -> Result<SpatialHessian<D>> {
        let (element, reduced) = self.locate(point)?;
        let sh = self.elements[element].spatial_hessian(&reduced)?;
        Ok(Self::embed_hessian(&sh))
    }

    fn spatial_jacobian_and_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<(SpatialJacobian<D>, Sparse<JacobianOfSpatialJacobian<D>>)> {
        let (element, reduced) = self.locate(point)?;
        let (sj, jsj) = self.elements[element].spatial_jacobian_and_jacobian(&reduced)?;
        let jsj: Sparse<JacobianOfSpatialJacobian<D>> =
            jsj.map(|values| values.iter().map(Self::embed_matrix).collect());
        Ok((Self::embed_spatial_jacobian(&sj), self.globalize(element, jsj)?))
    }

    fn spatial_hessian_and_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<(SpatialHessian<D>, Sparse<JacobianOfSpatialHessian<D>>)> {
        let (element, reduced) = self.locate(point)?;
        let (sh, jsh) = self.elements[element].spatial_hessian_and_jacobian(&reduced)?;
        let jsh: Sparse<JacobianOfSpatialHessian<D>> =
            jsh.map(|values| values.iter().map(Self::embed_hessian).collect());
        Ok((Self::embed_hessian(&sh), self.globalize(element, jsh)?))
    }
}
