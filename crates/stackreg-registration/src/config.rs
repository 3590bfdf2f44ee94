//! Penalty configuration.

use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::regularization::NormalizationMode;
use crate::schedule::SamplingSchedule;
use crate::validation::{validate_chunk_size, validate_valid_sample_ratio};

/// Configuration of the stacked bending-energy penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    /// Normalization of value and derivative.
    pub normalization: NormalizationMode,
    /// Minimum fraction of samples that must lie inside the transform support.
    /// Unset, only an evaluation without any valid sample fails.
    pub required_ratio_of_valid_samples: Option<f64>,
    /// Samples per parallel work item.
    pub chunk_size: usize,
    /// Redraw random samples after every optimizer iteration.
    pub new_samples_every_iteration: bool,
    /// Sample counts per resolution level.
    pub schedule: SamplingSchedule,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            normalization: NormalizationMode::ByCount,
            required_ratio_of_valid_samples: None,
            chunk_size: 256,
            new_samples_every_iteration: false,
            schedule: SamplingSchedule::default(),
        }
    }
}

impl PenaltyConfig {
    /// Create a new penalty config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalization(mut self, normalization: NormalizationMode) -> Self {
        self.normalization = normalization;
        self
    }

    /// Fail evaluations in which fewer than `ratio` of the samples are valid.
    pub fn with_required_ratio_of_valid_samples(mut self, ratio: f64) -> Self {
        self.required_ratio_of_valid_samples = Some(ratio);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Redraw random samples after every iteration.
    pub fn with_new_samples_every_iteration(mut self, enabled: bool) -> Self {
        self.new_samples_every_iteration = enabled;
        self
    }

    pub fn with_schedule(mut self, schedule: SamplingSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Check ratio, chunk size and schedule.
    pub fn validate(&self) -> Result<()> {
        if let Some(ratio) = self.required_ratio_of_valid_samples {
            validate_valid_sample_ratio(ratio)?;
        }
        validate_chunk_size(self.chunk_size)?;
        self.schedule.validate()
    }
}
