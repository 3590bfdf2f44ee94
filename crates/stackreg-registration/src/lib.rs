pub mod error;
pub mod validation;
pub mod config;
pub mod schedule;
pub mod sampler;
pub mod regularization;

pub use error::{RegistrationError, Result};
pub use config::PenaltyConfig;
pub use schedule::SamplingSchedule;
pub use sampler::{
    FullSampler, GridSampler, ImageSampler, PointMask, PointSetSampler, RandomSampler,
    RegionMask, SampleDomain,
};
pub use regularization::{
    evaluate_bending_energy, CostFunction, NormalizationMode, StackTransformBendingEnergyPenalty,
};
