//! Per-resolution sampling schedule.

use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::validation::validate_sample_count;

/// Number of spatial samples used at each resolution level.
///
/// Level 0 is the coarsest. An empty schedule leaves the sampler's own
/// sample count untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingSchedule {
    pub samples_per_level: Vec<usize>,
}

impl SamplingSchedule {
    pub fn new(samples_per_level: Vec<usize>) -> Self {
        Self { samples_per_level }
    }

    /// Same sample count at every level.
    pub fn uniform(levels: usize, samples: usize) -> Self {
        Self::new(vec![samples; levels])
    }

    /// Halve the sample count per coarser level, ending at `finest` samples.
    pub fn coarse_to_fine(levels: usize, finest: usize) -> Self {
        let samples_per_level = (0..levels)
            .map(|i| {
                u32::try_from(levels - 1 - i)
                    .ok()
                    .and_then(|exponent| finest.checked_shr(exponent))
                    .unwrap_or(0)
                    .max(1)
            })
            .collect();
        Self { samples_per_level }
    }

    pub fn number_of_levels(&self) -> usize {
        self.samples_per_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples_per_level.is_empty()
    }

    /// Sample count at `level`, if scheduled.
    pub fn samples_at(&self, level: usize) -> Option<usize> {
        self.samples_per_level.get(level).copied()
    }

    /// Every scheduled count must be positive.
    pub fn validate(&self) -> Result<()> {
        for (level, &count) in self.samples_per_level.iter().enumerate() {
            validate_sample_count(level, count)?;
        }
        Ok(())
    }
}
