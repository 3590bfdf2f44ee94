//! Regularization terms for slice-stack registration.
//!
//! The bending energy penalizes second-order spatial derivatives of a
//! transform. It is provided as a pure evaluation kernel over any
//! sparse-derivative transform and as a lifecycle component that owns a
//! stack transform and a sampler.

pub mod trait_;
pub mod bending_energy;
pub mod stack_bending_energy;

pub use trait_::{CostFunction, NormalizationMode};
pub use bending_energy::{evaluate_bending_energy, BendingEnergyEvaluation, EvaluationOptions};
pub use stack_bending_energy::{PenaltyState, StackTransformBendingEnergyPenalty};
