//! Sampler on a regular sub-grid of voxels.

use stackreg_core::spatial::Point;
use crate::error::Result;
use super::domain::SampleDomain;
use super::trait_::{retain_masked, ImageSampler, PointMask};

/// Every `step[i]`-th voxel along axis `i`.
#[derive(Debug, Clone)]
pub struct GridSampler<const D: usize> {
    domain: SampleDomain<D>,
    step: [usize; D],
    samples: Vec<Point<D>>,
}

impl<const D: usize> GridSampler<D> {
    pub fn new(domain: SampleDomain<D>, step: [usize; D]) -> Self {
        Self { domain, step: step.map(|s| s.max(1)), samples: Vec::new() }
    }

    pub fn step(&self) -> [usize; D] {
        self.step
    }
}

impl<const D: usize> ImageSampler<D> for GridSampler<D> {
    fn name(&self) -> &'static str {
        "GridSampler"
    }

    fn update(&mut self, mask: Option<&dyn PointMask<D>>) -> Result<()> {
        let mut samples = self.domain.strided_points(self.step);
        retain_masked(&mut samples, mask);
        self.samples = samples;
        Ok(())
    }

    fn samples(&self) -> &[Point<D>] {
        &self.samples
    }

    /// Pick an isotropic step giving roughly `count` points.
    fn set_number_of_samples(&mut self, count: usize) {
        let voxels = self.domain.number_of_voxels() as f64;
        let ratio = voxels / count.max(1) as f64;
        let step = ratio.powf(1.0 / D as f64).floor().max(1.0) as usize;
        self.step = [step; D];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackreg_core::spatial::Spacing;

    #[test]
    fn test_grid_step_from_count() {
        let domain = SampleDomain::new([16, 16], Point::new([0.0, 0.0]), Spacing::uniform(1.0)).unwrap();
        let mut sampler = GridSampler::new(domain, [1, 1]);
        sampler.set_number_of_samples(64);
        assert_eq!(sampler.step(), [2, 2]);
        sampler.update(None).unwrap();
        assert_eq!(sampler.samples().len(), 64);

        sampler.set_number_of_samples(10_000);
        assert_eq!(sampler.step(), [1, 1]);
    }
}
