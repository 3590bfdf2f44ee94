//! Sampler returning every voxel centre.

use stackreg_core::spatial::Point;
use crate::error::Result;
use super::domain::SampleDomain;
use super::trait_::{retain_masked, ImageSampler, PointMask};

/// Every voxel of the domain.
#[derive(Debug, Clone)]
pub struct FullSampler<const D: usize> {
    domain: SampleDomain<D>,
    samples: Vec<Point<D>>,
}

impl<const D: usize> FullSampler<D> {
    pub fn new(domain: SampleDomain<D>) -> Self {
        Self { domain, samples: Vec::new() }
    }

    pub fn domain(&self) -> &SampleDomain<D> {
        &self.domain
    }
}

impl<const D: usize> ImageSampler<D> for FullSampler<D> {
    fn name(&self) -> &'static str {
        "FullSampler"
    }

    fn update(&mut self, mask: Option<&dyn PointMask<D>>) -> Result<()> {
        let mut samples = self.domain.strided_points([1; D]);
        retain_masked(&mut samples, mask);
        self.samples = samples;
        Ok(())
    }

    fn samples(&self) -> &[Point<D>] {
        &self.samples
    }

    fn set_number_of_samples(&mut self, _count: usize) {}
}
