//! Sampler and mask traits.

use stackreg_core::spatial::Point;
use crate::error::Result;

/// Validity predicate on physical points.
pub trait PointMask<const D: usize>: Send + Sync {
    /// True when `point` may be sampled.
    fn contains(&self, point: &Point<D>) -> bool;
}

impl<const D: usize, F> PointMask<D> for F
where
    F: Fn(&Point<D>) -> bool + Send + Sync,
{
    fn contains(&self, point: &Point<D>) -> bool {
        self(point)
    }
}

/// Axis-aligned box mask, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMask<const D: usize> {
    pub lower: Point<D>,
    pub upper: Point<D>,
}

impl<const D: usize> RegionMask<D> {
    pub fn new(lower: Point<D>, upper: Point<D>) -> Self {
        Self { lower, upper }
    }
}

impl<const D: usize> PointMask<D> for RegionMask<D> {
    fn contains(&self, point: &Point<D>) -> bool {
        (0..D).all(|i| point[i] >= self.lower[i] && point[i] <= self.upper[i])
    }
}

/// Source of the sample points the penalty is evaluated at.
pub trait ImageSampler<const D: usize>: Send + Sync {
    /// Get the name of this sampler.
    fn name(&self) -> &'static str;

    /// Recompute the sample list, dropping points rejected by `mask`.
    fn update(&mut self, mask: Option<&dyn PointMask<D>>) -> Result<()>;

    /// Samples produced by the last `update`.
    fn samples(&self) -> &[Point<D>];

    /// Requested number of samples. Samplers with a fixed point set ignore it.
    fn set_number_of_samples(&mut self, count: usize);

    /// True when successive updates draw different samples.
    fn is_random(&self) -> bool {
        false
    }
}

pub(crate) fn retain_masked<const D: usize>(points: &mut Vec<Point<D>>, mask: Option<&dyn PointMask<D>>) {
    if let Some(mask) = mask {
        points.retain(|p| mask.contains(p));
    }
}
