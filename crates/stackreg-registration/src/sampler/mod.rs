//! Sample point selection.
//!
//! Samplers pick physical points of the fixed image domain at which the
//! penalty is evaluated. Image intensities are never read here; only the
//! voxel geometry of the domain matters.

pub mod trait_;
pub mod domain;
pub mod full;
pub mod grid;
pub mod random;
pub mod point_set;

pub use trait_::{ImageSampler, PointMask, RegionMask};
pub use domain::SampleDomain;
pub use full::FullSampler;
pub use grid::GridSampler;
pub use random::RandomSampler;
pub use point_set::PointSetSampler;
