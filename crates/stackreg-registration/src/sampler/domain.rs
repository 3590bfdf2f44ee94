//! Voxel grid geometry of the sampled image.

use stackreg_core::spatial::{Point, Spacing};
use crate::error::{RegistrationError, Result};

/// Size, origin and spacing of the fixed image grid.
///
/// Voxel `i` has its centre at `origin + i * spacing`. Linear indices run
/// with the first axis fastest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleDomain<const D: usize> {
    size: [usize; D],
    origin: Point<D>,
    spacing: Spacing<D>,
}

impl<const D: usize> SampleDomain<D> {
    pub fn new(size: [usize; D], origin: Point<D>, spacing: Spacing<D>) -> Result<Self> {
        if size.iter().any(|&s| s == 0) {
            return Err(RegistrationError::configuration(format!(
                "sample domain size must be positive, got {:?}",
                size
            )));
        }
        if !spacing.is_positive() || !origin.is_finite() {
            return Err(RegistrationError::configuration(format!(
                "invalid sample domain geometry: origin {:?}, spacing {:?}",
                origin.to_vec(),
                spacing.to_vec()
            )));
        }
        Ok(Self { size, origin, spacing })
    }

    pub fn size(&self) -> [usize; D] {
        self.size
    }

    pub fn origin(&self) -> Point<D> {
        self.origin
    }

    pub fn spacing(&self) -> Spacing<D> {
        self.spacing
    }

    pub fn number_of_voxels(&self) -> usize {
        self.size.iter().product()
    }

    /// Physical centre of the voxel with the given grid index.
    pub fn index_to_point(&self, index: &[usize; D]) -> Point<D> {
        Point::from_fn(|i| self.origin[i] + index[i] as f64 * self.spacing[i])
    }

    /// Grid index of a linear voxel index.
    pub fn unravel(&self, mut linear: usize) -> [usize; D] {
        let mut index = [0usize; D];
        for (axis, slot) in index.iter_mut().enumerate() {
            *slot = linear % self.size[axis];
            linear /= self.size[axis];
        }
        index
    }

    /// Physical centre of the voxel with the given linear index.
    pub fn point_at(&self, linear: usize) -> Point<D> {
        self.index_to_point(&self.unravel(linear))
    }

    /// Voxel centres on a strided sub-grid, first axis fastest.
    pub fn strided_points(&self, step: [usize; D]) -> Vec<Point<D>> {
        let counts: [usize; D] = std::array::from_fn(|i| self.size[i].div_ceil(step[i].max(1)));
        let total: usize = counts.iter().product();
        (0..total)
            .map(|mut linear| {
                let index: [usize; D] = std::array::from_fn(|i| {
                    let k = linear % counts[i];
                    linear /= counts[i];
                    k * step[i].max(1)
                });
                self.index_to_point(&index)
            })
            .collect()
    }
}
