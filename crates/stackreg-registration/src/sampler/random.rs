//! Sampler drawing uniformly random voxels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stackreg_core::spatial::Point;
use crate::error::{RegistrationError, Result};
use super::domain::SampleDomain;
use super::trait_::{ImageSampler, PointMask};

/// Attempts per requested sample before a masked draw gives up.
const MAX_ATTEMPTS_PER_SAMPLE: usize = 100;

/// `n` voxels drawn with replacement, redrawn on every update.
#[derive(Debug, Clone)]
pub struct RandomSampler<const D: usize> {
    domain: SampleDomain<D>,
    number_of_samples: usize,
    rng: StdRng,
    samples: Vec<Point<D>>,
}

impl<const D: usize> RandomSampler<D> {
    pub fn new(domain: SampleDomain<D>, number_of_samples: usize, seed: u64) -> Self {
        Self {
            domain,
            number_of_samples,
            rng: StdRng::seed_from_u64(seed),
            samples: Vec::new(),
        }
    }

    pub fn number_of_samples(&self) -> usize {
        self.number_of_samples
    }
}

impl<const D: usize> ImageSampler<D> for RandomSampler<D> {
    fn name(&self) -> &'static str {
        "RandomSampler"
    }

    fn update(&mut self, mask: Option<&dyn PointMask<D>>) -> Result<()> {
        let voxels = self.domain.number_of_voxels();
        let wanted = self.number_of_samples;
        let max_attempts = wanted.saturating_mul(MAX_ATTEMPTS_PER_SAMPLE);

        let mut samples = Vec::with_capacity(wanted);
        let mut attempts = 0;
        while samples.len() < wanted {
            if attempts == max_attempts {
                return Err(RegistrationError::sampler(format!(
                    "found only {} of {} samples inside the mask after {} attempts",
                    samples.len(),
                    wanted,
                    attempts
                )));
            }
            attempts += 1;
            let point = self.domain.point_at(self.rng.gen_range(0..voxels));
            if mask.map_or(true, |m| m.contains(&point)) {
                samples.push(point);
            }
        }

        self.samples = samples;
        Ok(())
    }

    fn samples(&self) -> &[Point<D>] {
        &self.samples
    }

    fn set_number_of_samples(&mut self, count: usize) {
        self.number_of_samples = count;
    }

    fn is_random(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackreg_core::spatial::Spacing;
    use crate::sampler::RegionMask;

    fn domain() -> SampleDomain<2> {
        SampleDomain::new([20, 20], Point::new([0.0, 0.0]), Spacing::uniform(1.0)).unwrap()
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let mut a = RandomSampler::new(domain(), 50, 7);
        let mut b = RandomSampler::new(domain(), 50, 7);
        a.update(None).unwrap();
        b.update(None).unwrap();
        assert_eq!(a.samples(), b.samples());
        assert_eq!(a.samples().len(), 50);

        let first = a.samples().to_vec();
        a.update(None).unwrap();
        assert_ne!(a.samples(), first.as_slice());
        assert!(a.is_random());
    }

    #[test]
    fn test_masked_draws_stay_inside() {
        let mask = RegionMask::new(Point::new([0.0, 0.0]), Point::new([9.0, 9.0]));
        let mut sampler = RandomSampler::new(domain(), 30, 1);
        sampler.update(Some(&mask)).unwrap();
        assert_eq!(sampler.samples().len(), 30);
        assert!(sampler.samples().iter().all(|p| mask.contains(p)));
    }

    #[test]
    fn test_empty_mask_fails() {
        let mask = |_: &Point<2>| false;
        let mut sampler = RandomSampler::new(domain(), 5, 1);
        assert!(matches!(sampler.update(Some(&mask)), Err(RegistrationError::SamplerError(_))));
    }
}
