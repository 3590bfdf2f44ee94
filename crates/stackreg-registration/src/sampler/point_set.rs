//! Sampler over a caller-provided point list.

use burn::tensor::{backend::Backend, Tensor};
use stackreg_core::spatial::Point;
use stackreg_core::transform::points_from_tensor;
use crate::error::Result;
use super::trait_::{retain_masked, ImageSampler, PointMask};

/// Fixed list of physical points.
#[derive(Debug, Clone)]
pub struct PointSetSampler<const D: usize> {
    points: Vec<Point<D>>,
    samples: Vec<Point<D>>,
}

impl<const D: usize> PointSetSampler<D> {
    pub fn new(points: Vec<Point<D>>) -> Self {
        Self { points, samples: Vec::new() }
    }

    /// Read the points from a `[N, D]` tensor.
    pub fn from_tensor<B: Backend>(points: Tensor<B, 2>) -> Result<Self> {
        Ok(Self::new(points_from_tensor::<B, D>(points)?))
    }

    pub fn points(&self) -> &[Point<D>] {
        &self.points
    }
}

impl<const D: usize> ImageSampler<D> for PointSetSampler<D> {
    fn name(&self) -> &'static str {
        "PointSetSampler"
    }

    fn update(&mut self, mask: Option<&dyn PointMask<D>>) -> Result<()> {
        let mut samples = self.points.clone();
        retain_masked(&mut samples, mask);
        self.samples = samples;
        Ok(())
    }

    fn samples(&self) -> &[Point<D>] {
        &self.samples
    }

    fn set_number_of_samples(&mut self, _count: usize) {}
}
