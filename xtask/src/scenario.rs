//! TOML scenario files for the `evaluate` command.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use stackreg_core::config::{ElementSpec, StackConfig};
use stackreg_core::spatial::{Point, Spacing};
use stackreg_registration::sampler::{FullSampler, GridSampler, ImageSampler, RandomSampler, SampleDomain};
use stackreg_registration::PenaltyConfig;

/// Volume dimension of the stacks built by xtask.
pub const VOLUME_DIM: usize = 3;
/// Slice dimension of the stacks built by xtask.
pub const SLICE_DIM: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    #[default]
    Full,
    Grid,
    Random,
}

fn default_number_of_samples() -> usize {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub size: Vec<usize>,
    pub origin: Vec<f64>,
    pub spacing: Vec<f64>,
    #[serde(default)]
    pub sampler: SamplerKind,
    #[serde(default = "default_number_of_samples")]
    pub number_of_samples: usize,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub stack: StackConfig,
    #[serde(default)]
    pub penalty: PenaltyConfig,
    pub sampling: SamplingConfig,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Three slices of 2D B-Splines sampled on a 40x40x3 grid.
    pub fn example() -> Self {
        let element = ElementSpec::bspline(vec![8, 8], vec![-8.0, -8.0], vec![8.0, 8.0]);
        Self {
            stack: StackConfig::uniform(element, 3),
            penalty: PenaltyConfig::default(),
            sampling: SamplingConfig {
                size: vec![40, 40, 3],
                origin: vec![0.0, 0.0, 0.0],
                spacing: vec![1.0, 1.0, 1.0],
                sampler: SamplerKind::Random,
                number_of_samples: default_number_of_samples(),
                seed: 42,
            },
        }
    }

    pub fn domain(&self) -> Result<SampleDomain<VOLUME_DIM>> {
        let s = &self.sampling;
        let size: [usize; VOLUME_DIM] = s
            .size
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("sampling.size needs {} entries", VOLUME_DIM))?;
        let origin = Point::from_slice(&s.origin)
            .ok_or_else(|| anyhow!("sampling.origin needs {} entries", VOLUME_DIM))?;
        let spacing = Spacing::from_slice(&s.spacing)
            .ok_or_else(|| anyhow!("sampling.spacing needs {} entries", VOLUME_DIM))?;
        Ok(SampleDomain::new(size, origin, spacing)?)
    }

    pub fn sampler(&self) -> Result<Box<dyn ImageSampler<VOLUME_DIM>>> {
        let domain = self.domain()?;
        let mut sampler: Box<dyn ImageSampler<VOLUME_DIM>> = match self.sampling.sampler {
            SamplerKind::Full => Box::new(FullSampler::new(domain)),
            SamplerKind::Grid => Box::new(GridSampler::new(domain, [1; VOLUME_DIM])),
            SamplerKind::Random => Box::new(RandomSampler::new(
                domain,
                self.sampling.number_of_samples,
                self.sampling.seed,
            )),
        };
        sampler.set_number_of_samples(self.sampling.number_of_samples);
        Ok(sampler)
    }
}
