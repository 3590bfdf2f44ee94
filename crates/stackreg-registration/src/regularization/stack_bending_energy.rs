//! Bending-energy penalty over a stack of B-Spline slice transforms.
//!
//! The penalty owns the stack transform and a sampler, follows the
//! optimizer lifecycle (initialize, before registration, before each
//! resolution) and evaluates the bending energy at the sampled points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use stackreg_core::transform::{SparseDerivativeTransform, StackTransform};
use crate::config::PenaltyConfig;
use crate::error::{RegistrationError, Result};
use crate::sampler::{ImageSampler, PointMask};
use crate::validation::validate_parameters;
use super::bending_energy::{evaluate_bending_energy, BendingEnergyEvaluation, EvaluationOptions};
use super::trait_::CostFunction;

/// Lifecycle state of the penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyState {
    Uninitialized,
    Initialized,
}

/// Bending energy of a [`StackTransform`] at sampled points.
///
/// # Type Parameters
/// * `D` - Dimensionality of the stacked volume
/// * `R` - Dimensionality of each slice transform
pub struct StackTransformBendingEnergyPenalty<const D: usize, const R: usize> {
    transform: Option<StackTransform<D, R>>,
    sampler: Option<Box<dyn ImageSampler<D>>>,
    mask: Option<Arc<dyn PointMask<D>>>,
    config: PenaltyConfig,
    declared_number_of_parameters: Option<usize>,
    state: PenaltyState,
    samples_stale: bool,
    number_of_samples_counted: usize,
    number_of_samples_skipped: usize,
    initialization_time: Option<Duration>,
    cancel: Arc<AtomicBool>,
}

impl<const D: usize, const R: usize> StackTransformBendingEnergyPenalty<D, R> {
    /// Create a penalty without transform or sampler.
    pub fn new(config: PenaltyConfig) -> Self {
        Self {
            transform: None,
            sampler: None,
            mask: None,
            config,
            declared_number_of_parameters: None,
            state: PenaltyState::Uninitialized,
            samples_stale: true,
            number_of_samples_counted: 0,
            number_of_samples_skipped: 0,
            initialization_time: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the stack transform. The penalty must be initialized again.
    pub fn set_transform(&mut self, transform: StackTransform<D, R>) {
        self.transform = Some(transform);
        self.state = PenaltyState::Uninitialized;
    }

    pub fn with_transform(mut self, transform: StackTransform<D, R>) -> Self {
        self.set_transform(transform);
        self
    }

    /// Set the sample source. The penalty must be initialized again.
    pub fn set_sampler(&mut self, sampler: Box<dyn ImageSampler<D>>) {
        self.sampler = Some(sampler);
        self.samples_stale = true;
        self.state = PenaltyState::Uninitialized;
    }

    pub fn with_sampler(mut self, sampler: Box<dyn ImageSampler<D>>) -> Self {
        self.set_sampler(sampler);
        self
    }

    /// Restrict sampling to points accepted by `mask`.
    pub fn set_mask(&mut self, mask: Arc<dyn PointMask<D>>) {
        self.mask = Some(mask);
        self.samples_stale = true;
    }

    /// Parameter count the optimizer will use, checked at initialization.
    pub fn set_number_of_parameters(&mut self, count: usize) {
        self.declared_number_of_parameters = Some(count);
        self.state = PenaltyState::Uninitialized;
    }

    pub fn transform(&self) -> Option<&StackTransform<D, R>> {
        self.transform.as_ref()
    }

    /// Hand the transform back to the caller.
    pub fn take_transform(&mut self) -> Option<StackTransform<D, R>> {
        self.state = PenaltyState::Uninitialized;
        self.transform.take()
    }

    pub fn config(&self) -> &PenaltyConfig {
        &self.config
    }

    pub fn state(&self) -> PenaltyState {
        self.state
    }

    /// Flag that aborts a running evaluation at the next chunk boundary.
    ///
    /// Once set, evaluations keep failing with `Cancelled` until the flag is
    /// stored `false` or the next resolution starts.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Valid samples of the last evaluation.
    pub fn number_of_samples_counted(&self) -> usize {
        self.number_of_samples_counted
    }

    /// Samples outside the transform support in the last evaluation.
    pub fn number_of_samples_skipped(&self) -> usize {
        self.number_of_samples_skipped
    }

    /// Duration of the last successful `initialize`.
    pub fn initialization_time(&self) -> Option<Duration> {
        self.initialization_time
    }

    /// Check collaborators and element types.
    ///
    /// Every stack element must be deformable and a declared parameter count
    /// must match the stack layout.
    pub fn initialize(&mut self) -> Result<()> {
        let start = Instant::now();

        let transform = self
            .transform
            .as_ref()
            .ok_or_else(|| RegistrationError::configuration("no stack transform set"))?;
        if self.sampler.is_none() {
            return Err(RegistrationError::configuration("no image sampler set"));
        }

        for (index, element) in transform.elements().iter().enumerate() {
            let kind = element.kind();
            if !kind.is_deformable() {
                return Err(RegistrationError::configuration(format!(
                    "stack element {} is a {}, expected a deformable B-Spline element",
                    index, kind
                )));
            }
        }

        let declared = self
            .declared_number_of_parameters
            .unwrap_or_else(|| transform.number_of_parameters());
        transform
            .layout()
            .validate(declared)
            .map_err(|e| RegistrationError::configuration(e.to_string()))?;

        self.state = PenaltyState::Initialized;
        self.samples_stale = true;
        let elapsed = start.elapsed();
        self.initialization_time = Some(elapsed);
        info!(
            "Initialized bending energy penalty: {} elements, {} parameters in {:?}",
            transform.number_of_elements(),
            transform.number_of_parameters(),
            elapsed
        );
        Ok(())
    }

    /// Validate the configuration before the first resolution.
    pub fn before_registration(&mut self) -> Result<()> {
        self.config.validate()?;
        info!(
            "Bending energy penalty: {:?} normalization, required valid ratio {:?}",
            self.config.normalization, self.config.required_ratio_of_valid_samples
        );
        Ok(())
    }

    /// Apply the scheduled sample count for `level`.
    pub fn before_each_resolution(&mut self, level: usize) -> Result<()> {
        if self.state == PenaltyState::Uninitialized {
            return Err(RegistrationError::invalid_state("penalty is not initialized"));
        }
        let sampler = self
            .sampler
            .as_mut()
            .ok_or_else(|| RegistrationError::configuration("no image sampler set"))?;

        if !self.config.schedule.is_empty() {
            let count = self.config.schedule.samples_at(level).ok_or_else(|| {
                RegistrationError::configuration(format!(
                    "no sample count scheduled for resolution {} of {}",
                    level,
                    self.config.schedule.number_of_levels()
                ))
            })?;
            sampler.set_number_of_samples(count);
        }

        self.cancel.store(false, Ordering::Relaxed);
        self.state = PenaltyState::Initialized;
        self.samples_stale = true;
        info!("Bending energy penalty: resolution {} using {}", level, sampler.name());
        Ok(())
    }

    /// Mark random samples for redrawing before the next evaluation.
    pub fn select_new_samples(&mut self) -> Result<()> {
        let sampler = self
            .sampler
            .as_ref()
            .ok_or_else(|| RegistrationError::invalid_state("no image sampler set"))?;
        if sampler.is_random() {
            self.samples_stale = true;
        }
        Ok(())
    }

    /// Hook called by the optimizer after every iteration.
    pub fn after_each_iteration(&mut self) -> Result<()> {
        if self.config.new_samples_every_iteration {
            self.select_new_samples()?;
        }
        Ok(())
    }

    fn refresh_samples(&mut self) -> Result<()> {
        if !self.samples_stale {
            return Ok(());
        }
        let sampler = self
            .sampler
            .as_mut()
            .ok_or_else(|| RegistrationError::configuration("no image sampler set"))?;
        sampler.update(self.mask.as_deref())?;
        self.samples_stale = false;
        debug!("{} selected {} samples", sampler.name(), sampler.samples().len());
        Ok(())
    }

    fn evaluate(&mut self, parameters: &[f64], with_derivative: bool) -> Result<BendingEnergyEvaluation> {
        if self.state == PenaltyState::Uninitialized {
            return Err(RegistrationError::invalid_state("penalty is not initialized"));
        }

        let transform = self
            .transform
            .as_mut()
            .ok_or_else(|| RegistrationError::configuration("no stack transform set"))?;
        validate_parameters(parameters, transform.number_of_parameters())?;
        transform.set_parameters(parameters)?;

        self.refresh_samples()?;

        let (Some(transform), Some(sampler)) = (self.transform.as_ref(), self.sampler.as_ref()) else {
            return Err(RegistrationError::configuration("penalty is missing its transform or sampler"));
        };
        let samples = sampler.samples();
        let options = EvaluationOptions {
            normalization: self.config.normalization,
            chunk_size: self.config.chunk_size,
            with_derivative,
        };
        let evaluation = evaluate_bending_energy(transform, samples, &options, Some(self.cancel.as_ref()))?;

        self.number_of_samples_counted = evaluation.number_of_samples_counted;
        self.number_of_samples_skipped = evaluation.number_of_samples_skipped;

        let total = samples.len();
        let valid = evaluation.number_of_samples_counted;
        let required = self.config.required_ratio_of_valid_samples;
        let below_ratio = required.is_some_and(|ratio| (valid as f64) < ratio * total as f64);
        if valid == 0 || below_ratio {
            return Err(RegistrationError::TooFewSamples {
                valid,
                total,
                required_ratio: required.unwrap_or(0.0),
            });
        }
        if evaluation.number_of_samples_skipped * 2 > total {
            warn!(
                "{} of {} samples fall outside the stack transform support",
                evaluation.number_of_samples_skipped, total
            );
        }

        debug!(
            "Bending energy {:.6e} over {} of {} samples",
            evaluation.value, valid, total
        );
        Ok(evaluation)
    }
}

impl<const D: usize, const R: usize> CostFunction for StackTransformBendingEnergyPenalty<D, R> {
    fn name(&self) -> &'static str {
        "StackTransformBendingEnergyPenalty"
    }

    fn number_of_parameters(&self) -> usize {
        self.transform.as_ref().map_or(0, |t| t.number_of_parameters())
    }

    fn value(&mut self, parameters: &[f64]) -> Result<f64> {
        Ok(self.evaluate(parameters, false)?.value)
    }

    fn derivative(&mut self, parameters: &[f64]) -> Result<Vec<f64>> {
        Ok(self.evaluate(parameters, true)?.derivative)
    }

    fn value_and_derivative(&mut self, parameters: &[f64]) -> Result<(f64, Vec<f64>)> {
        let evaluation = self.evaluate(parameters, true)?;
        Ok((evaluation.value, evaluation.derivative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackreg_core::spatial::{Point, Spacing, Vector};
    use stackreg_core::transform::{BSplineTransform, ElementTransform, TranslationTransform};
    use crate::sampler::{PointSetSampler, RegionMask};
    use crate::schedule::SamplingSchedule;

    fn slice(coefficients: [f64; 4]) -> ElementTransform<1> {
        BSplineTransform::<1>::new([4], Point::new([-1.0]), Spacing::uniform(1.0))
            .unwrap()
            .with_coefficients(&coefficients)
            .unwrap()
            .into()
    }

    fn penalty(points: Vec<Point<2>>) -> StackTransformBendingEnergyPenalty<2, 1> {
        let stack = StackTransform::<2, 1>::new(vec![slice([0.0; 4]), slice([3.0, 0.0, 0.0, 3.0])], 0.0, 1.0).unwrap();
        let mut penalty = StackTransformBendingEnergyPenalty::new(PenaltyConfig::default())
            .with_transform(stack)
            .with_sampler(Box::new(PointSetSampler::new(points)));
        penalty.initialize().unwrap();
        penalty
    }

    fn current_parameters(penalty: &StackTransformBendingEnergyPenalty<2, 1>) -> Vec<f64> {
        penalty.transform().unwrap().parameters()
    }

    #[test]
    fn test_uninitialized_evaluation_fails() {
        let mut penalty = StackTransformBendingEnergyPenalty::<2, 1>::new(PenaltyConfig::default());
        assert!(matches!(penalty.value(&[]), Err(RegistrationError::InvalidState(_))));
        assert!(matches!(penalty.initialize(), Err(RegistrationError::ConfigurationError(_))));
    }

    #[test]
    fn test_missing_sampler() {
        let stack = StackTransform::<2, 1>::new(vec![slice([0.0; 4])], 0.0, 1.0).unwrap();
        let mut penalty = StackTransformBendingEnergyPenalty::new(PenaltyConfig::default()).with_transform(stack);
        assert!(matches!(penalty.initialize(), Err(RegistrationError::ConfigurationError(_))));
    }

    #[test]
    fn test_translation_element_rejected() {
        let elements = vec![slice([0.0; 4]), TranslationTransform::<1>::new(Vector::zeros()).into()];
        let stack = StackTransform::<2, 1>::new(elements, 0.0, 1.0).unwrap();
        let mut penalty = StackTransformBendingEnergyPenalty::new(PenaltyConfig::default())
            .with_transform(stack)
            .with_sampler(Box::new(PointSetSampler::new(vec![Point::new([0.5, 0.0])])));
        let err = penalty.initialize().unwrap_err();
        assert!(matches!(err, RegistrationError::ConfigurationError(ref msg) if msg.contains("TranslationTransform")));
    }

    #[test]
    fn test_declared_parameter_count_checked() {
        let stack = StackTransform::<2, 1>::new(vec![slice([0.0; 4]), slice([0.0; 4])], 0.0, 1.0).unwrap();
        let mut penalty = StackTransformBendingEnergyPenalty::new(PenaltyConfig::default())
            .with_transform(stack)
            .with_sampler(Box::new(PointSetSampler::new(vec![Point::new([0.5, 0.0])])));
        penalty.set_number_of_parameters(9);
        assert!(matches!(penalty.initialize(), Err(RegistrationError::ConfigurationError(_))));
        penalty.set_number_of_parameters(8);
        assert!(penalty.initialize().is_ok());
        assert!(penalty.initialization_time().is_some());
    }

    #[test]
    fn test_two_slice_value_and_derivative() {
        let mut penalty = penalty(vec![Point::new([0.5, 0.0]), Point::new([0.5, 1.0])]);
        let parameters = current_parameters(&penalty);

        let (value, derivative) = penalty.value_and_derivative(&parameters).unwrap();
        assert!((value - 4.5).abs() < 1e-12);
        assert_eq!(penalty.number_of_samples_counted(), 2);
        assert_eq!(derivative.len(), 8);
        assert_eq!(&derivative[..4], &[0.0; 4]);
        let expected = [1.5, -1.5, -1.5, 1.5];
        for (d, e) in derivative[4..].iter().zip(expected.iter()) {
            assert!((d - e).abs() < 1e-12);
        }

        assert_eq!(penalty.value(&parameters).unwrap(), value);
        assert_eq!(penalty.derivative(&parameters).unwrap(), derivative);
    }

    #[test]
    fn test_out_of_support_samples_excluded() {
        let inside = vec![Point::new([0.5, 0.0]), Point::new([0.5, 1.0])];
        let mut reference = penalty(inside.clone());
        let parameters = current_parameters(&reference);
        let (value, derivative) = reference.value_and_derivative(&parameters).unwrap();

        let mut points = inside;
        points.push(Point::new([5.0, 0.0]));
        points.push(Point::new([0.5, 9.0]));
        let mut with_outliers = penalty(points);
        let (value_o, derivative_o) = with_outliers.value_and_derivative(&parameters).unwrap();

        assert_eq!(value, value_o);
        assert_eq!(derivative, derivative_o);
        assert_eq!(with_outliers.number_of_samples_counted(), 2);
        assert_eq!(with_outliers.number_of_samples_skipped(), 2);
    }

    #[test]
    fn test_mostly_outside_samples_keep_value() {
        let mut points = vec![Point::new([0.5, 0.0]), Point::new([0.5, 1.0])];
        points.extend((0..7).map(|i| Point::new([10.0 + i as f64, 0.0])));
        let mut penalty = penalty(points);
        let parameters = current_parameters(&penalty);
        let value = penalty.value(&parameters).unwrap();
        assert!((value - 4.5).abs() < 1e-12);
        assert_eq!(penalty.number_of_samples_counted(), 2);
        assert_eq!(penalty.number_of_samples_skipped(), 7);
    }

    #[test]
    fn test_no_valid_samples() {
        let mut penalty = penalty(vec![Point::new([10.0, 0.0]), Point::new([0.5, 9.0])]);
        let parameters = current_parameters(&penalty);
        let err = penalty.value(&parameters).unwrap_err();
        assert!(matches!(err, RegistrationError::TooFewSamples { valid: 0, total: 2, .. }));
    }

    #[test]
    fn test_required_ratio_opt_in() {
        let mut points = vec![Point::new([0.5, 0.0])];
        points.extend((0..5).map(|i| Point::new([10.0 + i as f64, 0.0])));
        let stack = StackTransform::<2, 1>::new(vec![slice([0.0; 4]), slice([3.0, 0.0, 0.0, 3.0])], 0.0, 1.0).unwrap();
        let config = PenaltyConfig::default().with_required_ratio_of_valid_samples(0.25);
        let mut penalty = StackTransformBendingEnergyPenalty::new(config)
            .with_transform(stack)
            .with_sampler(Box::new(PointSetSampler::new(points)));
        penalty.initialize().unwrap();
        let parameters = current_parameters(&penalty);
        let err = penalty.value(&parameters).unwrap_err();
        assert!(matches!(err, RegistrationError::TooFewSamples { valid: 1, total: 6, .. }));
    }

    #[test]
    fn test_parameter_validation() {
        let mut penalty = penalty(vec![Point::new([0.5, 0.0])]);
        assert!(matches!(penalty.value(&[0.0; 7]), Err(RegistrationError::DimensionMismatch(_))));
        let mut parameters = vec![0.0; 8];
        parameters[3] = f64::NAN;
        assert!(matches!(penalty.value(&parameters), Err(RegistrationError::NumericalInstability(_))));
    }

    #[test]
    fn test_mask_filters_samples() {
        let mut penalty = penalty(vec![Point::new([0.5, 0.0]), Point::new([0.5, 1.0])]);
        penalty.set_mask(Arc::new(RegionMask::new(Point::new([0.0, 0.5]), Point::new([1.0, 1.5]))));
        let parameters = current_parameters(&penalty);
        let value = penalty.value(&parameters).unwrap();
        assert!((value - 9.0).abs() < 1e-12);
        assert_eq!(penalty.number_of_samples_counted(), 1);
    }

    #[test]
    fn test_resolution_schedule() {
        let config = PenaltyConfig::default().with_schedule(SamplingSchedule::new(vec![10, 20]));
        let stack = StackTransform::<2, 1>::new(vec![slice([0.0; 4])], 0.0, 1.0).unwrap();
        let mut penalty = StackTransformBendingEnergyPenalty::new(config)
            .with_transform(stack)
            .with_sampler(Box::new(PointSetSampler::new(vec![Point::new([0.5, 0.0])])));
        assert!(matches!(penalty.before_each_resolution(0), Err(RegistrationError::InvalidState(_))));
        penalty.initialize().unwrap();
        penalty.before_registration().unwrap();
        assert!(penalty.before_each_resolution(1).is_ok());
        assert!(matches!(penalty.before_each_resolution(2), Err(RegistrationError::ConfigurationError(_))));
    }

    #[test]
    fn test_cancellation() {
        let mut penalty = penalty(vec![Point::new([0.5, 1.0])]);
        let parameters = current_parameters(&penalty);
        penalty.cancellation_flag().store(true, Ordering::Relaxed);
        assert!(matches!(penalty.value(&parameters), Err(RegistrationError::Cancelled)));
        assert!(matches!(penalty.value(&parameters), Err(RegistrationError::Cancelled)));

        penalty.before_each_resolution(0).unwrap();
        assert!(!penalty.cancellation_flag().load(Ordering::Relaxed));
        assert!((penalty.value(&parameters).unwrap() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_name() {
        let penalty = penalty(vec![Point::new([0.5, 0.0])]);
        assert_eq!(penalty.name(), "StackTransformBendingEnergyPenalty");
        assert_eq!(penalty.number_of_parameters(), 8);
    }
}
