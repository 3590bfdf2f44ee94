//! B-Spline transform implementation.
//!
//! This module provides a cubic B-Spline free-form deformation with
//! analytic spatial derivatives and sparse parameter derivatives.

use nalgebra::{SMatrix, SVector};
use crate::error::{Result, TransformError};
use crate::spatial::{Point, Spacing};
use super::derivative::{
    zero_parameter_jacobian, zero_spatial_hessian, JacobianOfSpatialHessian,
    JacobianOfSpatialJacobian, NonZeroIndices, ParameterJacobian, Sparse, SpatialHessian,
    SpatialJacobian,
};
use super::trait_::{SparseDerivativeTransform, TransformKind};

/// Number of control points a cubic basis function spans along one axis.
const SUPPORT_WIDTH: usize = 4;

/// B-Spline Transform (Free-form deformation).
///
/// Uses a regular grid of control points to define a smooth displacement
/// field: `T(x) = x + sum_j w_j(x) c_j`, where `w_j` is a tensor product of
/// cubic B-Spline basis functions.
///
/// Parameters are ordered dimension-major: first the x-coefficients of every
/// control point, then the y-coefficients, and so on. Control points are
/// flattened with the first axis running fastest.
///
/// A point is inside the support when its continuous grid index
/// `c_i = (x_i - origin_i) / spacing_i` satisfies `1 <= c_i <= size_i - 2` on
/// every axis, so that all `4^D` control points of its support exist.
#[derive(Debug)]
pub struct BSplineTransform<const D: usize> {
    grid_size: [usize; D],
    grid_origin: Point<D>,
    grid_spacing: Spacing<D>,
    grid_strides: [usize; D],
    coefficients: Vec<f64>,
}

/// Cubic basis values and their first and second derivatives at one axis
/// coordinate, already scaled by the grid spacing.
#[derive(Debug, Clone, Copy)]
struct AxisBasis {
    orders: [[f64; SUPPORT_WIDTH]; 3],
}

/// Control points influencing one point.
struct SupportRegion<const D: usize> {
    start: [usize; D],
    bases: [AxisBasis; D],
}

impl<const D: usize> BSplineTransform<D> {
    /// Create a new B-Spline transform with zero coefficients.
    ///
    /// # Arguments
    /// * `grid_size` - Number of control points along each dimension (at least 4)
    /// * `grid_origin` - Physical position of control point `[0; D]`
    /// * `grid_spacing` - Distance between control points along each dimension
    pub fn new(grid_size: [usize; D], grid_origin: Point<D>, grid_spacing: Spacing<D>) -> Result<Self> {
        if D == 0 {
            return Err(TransformError::invalid_configuration(
                "BSplineTransform needs at least one dimension",
            ));
        }
        if let Some(axis) = grid_size.iter().position(|&n| n < SUPPORT_WIDTH) {
            return Err(TransformError::invalid_configuration(format!(
                "grid size {} along axis {} is below the cubic support width {}",
                grid_size[axis], axis, SUPPORT_WIDTH
            )));
        }
        if !grid_spacing.is_positive() {
            return Err(TransformError::invalid_configuration(format!(
                "grid spacing must be positive, got {:?}",
                grid_spacing.to_vec()
            )));
        }
        if !grid_origin.is_finite() {
            return Err(TransformError::invalid_configuration("grid origin must be finite"));
        }

        let mut grid_strides = [1usize; D];
        for i in 1..D {
            grid_strides[i] = grid_strides[i - 1] * grid_size[i - 1];
        }
        let control_points: usize = grid_size.iter().product();

        Ok(Self {
            grid_size,
            grid_origin,
            grid_spacing,
            grid_strides,
            coefficients: vec![0.0; D * control_points],
        })
    }

    /// Create a transform whose valid region covers the box
    /// `[origin, origin + physical_size]`.
    ///
    /// One control point is placed before the box and enough after it so that
    /// every point of the box has a complete support.
    pub fn covering(origin: Point<D>, physical_size: [f64; D], grid_spacing: Spacing<D>) -> Result<Self> {
        if physical_size.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(TransformError::invalid_configuration(format!(
                "physical size must be finite and non-negative, got {:?}",
                physical_size
            )));
        }
        if !grid_spacing.is_positive() {
            return Err(TransformError::invalid_configuration(format!(
                "grid spacing must be positive, got {:?}",
                grid_spacing.to_vec()
            )));
        }
        let grid_size: [usize; D] = std::array::from_fn(|i| {
            (physical_size[i] / grid_spacing[i]).ceil() as usize + SUPPORT_WIDTH - 1
        });
        let grid_origin = Point::from_fn(|i| origin[i] - grid_spacing[i]);
        Self::new(grid_size, grid_origin, grid_spacing)
    }

    /// Replace the coefficients, consuming and returning the transform.
    pub fn with_coefficients(mut self, coefficients: &[f64]) -> Result<Self> {
        self.set_parameters(coefficients)?;
        Ok(self)
    }

    /// Get the grid size.
    pub fn grid_size(&self) -> [usize; D] {
        self.grid_size
    }

    /// Get the grid origin.
    pub fn grid_origin(&self) -> Point<D> {
        self.grid_origin
    }

    /// Get the control point spacing.
    pub fn grid_spacing(&self) -> Spacing<D> {
        self.grid_spacing
    }

    /// Total number of control points.
    pub fn number_of_control_points(&self) -> usize {
        self.grid_size.iter().product()
    }

    /// Number of control points influencing a single point.
    pub fn support_size(&self) -> usize {
        SUPPORT_WIDTH.pow(D as u32)
    }

    /// Get the coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Parameter index of the coefficient of `dimension` at a grid position.
    pub fn parameter_index(&self, dimension: usize, control_point: [usize; D]) -> usize {
        dimension * self.number_of_control_points() + self.flat_index(&control_point)
    }

    fn flat_index(&self, control_point: &[usize; D]) -> usize {
        control_point
            .iter()
            .zip(self.grid_strides.iter())
            .map(|(c, s)| c * s)
            .sum()
    }

    /// Compute Cubic B-Spline basis functions for `u` in `[0, 1]`.
    fn bspline_basis(u: f64) -> [f64; SUPPORT_WIDTH] {
        let one_minus_u = 1.0 - u;
        let u2 = u * u;
        let u3 = u2 * u;
        [
            one_minus_u * one_minus_u * one_minus_u / 6.0,
            (3.0 * u3 - 6.0 * u2 + 4.0) / 6.0,
            (-3.0 * u3 + 3.0 * u2 + 3.0 * u + 1.0) / 6.0,
            u3 / 6.0,
        ]
    }

    /// First derivatives of the cubic basis with respect to `u`.
    fn bspline_basis_derivative(u: f64) -> [f64; SUPPORT_WIDTH] {
        let one_minus_u = 1.0 - u;
        [
            -0.5 * one_minus_u * one_minus_u,
            1.5 * u * u - 2.0 * u,
            -1.5 * u * u + u + 0.5,
            0.5 * u * u,
        ]
    }

    /// Second derivatives of the cubic basis with respect to `u`.
    fn bspline_basis_second_derivative(u: f64) -> [f64; SUPPORT_WIDTH] {
        [1.0 - u, 3.0 * u - 2.0, 1.0 - 3.0 * u, u]
    }

    fn axis_basis(u: f64, spacing: f64) -> AxisBasis {
        let value = Self::bspline_basis(u);
        let first = Self::bspline_basis_derivative(u).map(|b| b / spacing);
        let second = Self::bspline_basis_second_derivative(u).map(|b| b / (spacing * spacing));
        AxisBasis { orders: [value, first, second] }
    }

    /// Locate the support of `point`, failing outside the valid region.
    fn support(&self, point: &Point<D>) -> Result<SupportRegion<D>> {
        let mut start = [0usize; D];
        let mut bases = [AxisBasis { orders: [[0.0; SUPPORT_WIDTH]; 3] }; D];

        for i in 0..D {
            let mut c = (point[i] - self.grid_origin[i]) / self.grid_spacing[i];
            let upper = (self.grid_size[i] - 2) as f64;
            if !c.is_finite() {
                return Err(TransformError::out_of_domain(&point.to_vec()));
            }
            // Rounding of the grid coordinate must not reject points on the
            // edge of the valid region.
            let tolerance = 4.0
                * f64::EPSILON
                * ((point[i].abs() + self.grid_origin[i].abs()) / self.grid_spacing[i] + upper);
            if c < 1.0 && c >= 1.0 - tolerance {
                c = 1.0;
            } else if c > upper && c <= upper + tolerance {
                c = upper;
            }
            if c < 1.0 || c > upper {
                return Err(TransformError::out_of_domain(&point.to_vec()));
            }
            // At the upper edge the last complete window is used with u = 1.
            let base = (c.floor() as usize).min(self.grid_size[i] - 3);
            start[i] = base - 1;
            bases[i] = Self::axis_basis(c - base as f64, self.grid_spacing[i]);
        }

        Ok(SupportRegion { start, bases })
    }

    /// Window offsets of support entry `m`, first axis fastest.
    fn window_offsets(m: usize) -> [usize; D] {
        std::array::from_fn(|i| (m / SUPPORT_WIDTH.pow(i as u32)) % SUPPORT_WIDTH)
    }

    /// Flat control point indices of the support, strictly increasing.
    fn support_control_points(&self, support: &SupportRegion<D>) -> Vec<usize> {
        (0..self.support_size())
            .map(|m| {
                let offsets = Self::window_offsets(m);
                let position: [usize; D] = std::array::from_fn(|i| support.start[i] + offsets[i]);
                self.flat_index(&position)
            })
            .collect()
    }

    /// Tensor-product basis value with per-axis derivative orders.
    fn basis_product(support: &SupportRegion<D>, offsets: &[usize; D], orders: &[usize; D]) -> f64 {
        (0..D)
            .map(|i| support.bases[i].orders[orders[i]][offsets[i]])
            .product()
    }

    fn weights(&self, support: &SupportRegion<D>) -> Vec<f64> {
        (0..self.support_size())
            .map(|m| Self::basis_product(support, &Self::window_offsets(m), &[0; D]))
            .collect()
    }

    fn weight_gradients(&self, support: &SupportRegion<D>) -> Vec<SVector<f64, D>> {
        (0..self.support_size())
            .map(|m| {
                let offsets = Self::window_offsets(m);
                SVector::<f64, D>::from_fn(|i, _| {
                    let mut orders = [0usize; D];
                    orders[i] = 1;
                    Self::basis_product(support, &offsets, &orders)
                })
            })
            .collect()
    }

    fn weight_hessians(&self, support: &SupportRegion<D>) -> Vec<SMatrix<f64, D, D>> {
        (0..self.support_size())
            .map(|m| {
                let offsets = Self::window_offsets(m);
                SMatrix::<f64, D, D>::from_fn(|i, j| {
                    let mut orders = [0usize; D];
                    orders[i] += 1;
                    orders[j] += 1;
                    Self::basis_product(support, &offsets, &orders)
                })
            })
            .collect()
    }

    fn support_nonzero_indices(&self, control_points: &[usize]) -> NonZeroIndices {
        let ncp = self.number_of_control_points();
        (0..D)
            .flat_map(|k| control_points.iter().map(move |cp| k * ncp + cp))
            .collect()
    }

    fn coefficient_at(&self, dimension: usize, control_point: usize) -> f64 {
        self.coefficients[dimension * self.number_of_control_points() + control_point]
    }
}

impl<const D: usize> SparseDerivativeTransform<D> for BSplineTransform<D> {
    fn kind(&self) -> TransformKind {
        TransformKind::BSpline
    }

    fn number_of_parameters(&self) -> usize {
        self.coefficients.len()
    }

    fn parameters(&self) -> Vec<f64> {
        self.coefficients.clone()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<()> {
        if parameters.len() != self.coefficients.len() {
            return Err(TransformError::ParameterCountMismatch {
                expected: self.coefficients.len(),
                actual: parameters.len(),
            });
        }
        self.coefficients.copy_from_slice(parameters);
        Ok(())
    }

    fn number_of_nonzero_jacobian_indices(&self) -> usize {
        D * self.support_size()
    }

    fn nonzero_jacobian_indices(&self, point: &Point<D>) -> Result<NonZeroIndices> {
        let support = self.support(point)?;
        Ok(self.support_nonzero_indices(&self.support_control_points(&support)))
    }

    fn transform_point(&self, point: &Point<D>) -> Result<Point<D>> {
        let support = self.support(point)?;
        let control_points = self.support_control_points(&support);
        let weights = self.weights(&support);

        Ok(Point::from_fn(|k| {
            let displacement: f64 = control_points
                .iter()
                .zip(weights.iter())
                .map(|(&cp, w)| w * self.coefficient_at(k, cp))
                .sum();
            point[k] + displacement
        }))
    }

    fn jacobian(&self, point: &Point<D>) -> Result<Sparse<ParameterJacobian<D>>> {
        let support = self.support(point)?;
        let control_points = self.support_control_points(&support);
        let weights = self.weights(&support);
        let s = weights.len();

        // Block diagonal: output k only depends on the k-th coefficient block.
        let mut jacobian = zero_parameter_jacobian::<D>(D * s);
        for k in 0..D {
            for (m, w) in weights.iter().enumerate() {
                jacobian[(k, k * s + m)] = *w;
            }
        }

        Ok(Sparse::new(jacobian, self.support_nonzero_indices(&control_points)))
    }

    fn spatial_jacobian(&self, point: &Point<D>) -> Result<SpatialJacobian<D>> {
        let support = self.support(point)?;
        let control_points = self.support_control_points(&support);
        let gradients = self.weight_gradients(&support);

        let mut sj = SpatialJacobian::<D>::identity();
        for k in 0..D {
            for (&cp, g) in control_points.iter().zip(gradients.iter()) {
                let c = self.coefficient_at(k, cp);
                for i in 0..D {
                    sj[(k, i)] += c * g[i];
                }
            }
        }
        Ok(sj)
    }

    fn spatial_hessian(&self, point: &Point<D>) -> Result<SpatialHessian<D>> {
        let support = self.support(point)?;
        let control_points = self.support_control_points(&support);
        let hessians = self.weight_hessians(&support);

        let mut sh = zero_spatial_hessian::<D>();
        for (k, component) in sh.iter_mut().enumerate() {
            for (&cp, h) in control_points.iter().zip(hessians.iter()) {
                *component += h * self.coefficient_at(k, cp);
            }
        }
        Ok(sh)
    }

    fn spatial_jacobian_and_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<(SpatialJacobian<D>, Sparse<JacobianOfSpatialJacobian<D>>)> {
        let support = self.support(point)?;
        let control_points = self.support_control_points(&support);
        let gradients = self.weight_gradients(&support);

        let mut sj = SpatialJacobian::<D>::identity();
        let mut jsj = Vec::with_capacity(D * gradients.len());
        for k in 0..D {
            for (&cp, g) in control_points.iter().zip(gradients.iter()) {
                let c = self.coefficient_at(k, cp);
                let mut d = SpatialJacobian::<D>::zeros();
                for i in 0..D {
                    sj[(k, i)] += c * g[i];
                    d[(k, i)] = g[i];
                }
                jsj.push(d);
            }
        }

        Ok((sj, Sparse::new(jsj, self.support_nonzero_indices(&control_points))))
    }

    fn spatial_hessian_and_jacobian(
        &self,
        point: &Point<D>,
    ) -> Result<(SpatialHessian<D>, Sparse<JacobianOfSpatialHessian<D>>)> {
        let support = self.support(point)?;
        let control_points = self.support_control_points(&support);
        let hessians = self.weight_hessians(&support);

        let mut sh = zero_spatial_hessian::<D>();
        let mut jsh = Vec::with_capacity(D * hessians.len());
        for k in 0..D {
            for (&cp, h) in control_points.iter().zip(hessians.iter()) {
                sh[k] += h * self.coefficient_at(k, cp);
                let mut d = zero_spatial_hessian::<D>();
                d[k] = *h;
                jsh.push(d);
            }
        }

        Ok((sh, Sparse::new(jsh, self.support_nonzero_indices(&control_points))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::derivative::is_strictly_increasing;

    fn grid_2d() -> BSplineTransform<2> {
        // 4x4 grid, spacing 10 -> valid region [10, 20] x [10, 20]
        BSplineTransform::<2>::new([4, 4], Point::origin(), Spacing::uniform(10.0)).unwrap()
    }

    fn wavy_2d() -> BSplineTransform<2> {
        let t = BSplineTransform::<2>::new([6, 5], Point::new([-2.0, -1.0]), Spacing::new([2.0, 3.0])).unwrap();
        let coefficients: Vec<f64> = (0..t.number_of_parameters())
            .map(|i| 0.3 * (i as f64 * 0.7).sin())
            .collect();
        t.with_coefficients(&coefficients).unwrap()
    }

    #[test]
    fn test_bspline_transform_creation() {
        let t = BSplineTransform::<3>::new([4, 5, 6], Point::origin(), Spacing::uniform(2.0)).unwrap();
        assert_eq!(t.grid_size(), [4, 5, 6]);
        assert_eq!(t.number_of_control_points(), 120);
        assert_eq!(t.number_of_parameters(), 360);
        assert_eq!(t.number_of_nonzero_jacobian_indices(), 3 * 64);
    }

    #[test]
    fn test_bspline_rejects_small_grid() {
        let err = BSplineTransform::<2>::new([3, 4], Point::origin(), Spacing::uniform(1.0)).unwrap_err();
        assert!(matches!(err, TransformError::InvalidConfiguration(_)));

        let err = BSplineTransform::<2>::new([4, 4], Point::origin(), Spacing::new([1.0, -1.0])).unwrap_err();
        assert!(matches!(err, TransformError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_bspline_transform_2d() {
        let mut t = grid_2d();
        // Displace the control point at (1, 1) by (1.0, 1.0)
        let mut coefficients = vec![0.0; t.number_of_parameters()];
        coefficients[t.parameter_index(0, [1, 1])] = 1.0;
        coefficients[t.parameter_index(1, [1, 1])] = 1.0;
        t.set_parameters(&coefficients).unwrap();

        // (10, 10) has grid index (1, 1): u = 0, window starts at 0, and the
        // weight of control point (1, 1) is B1(0)^2 = 4/9.
        let transformed = t.transform_point(&Point::new([10.0, 10.0])).unwrap();
        let expected_disp = 4.0 / 9.0;
        assert!((transformed[0] - (10.0 + expected_disp)).abs() < 1e-12);
        assert!((transformed[1] - (10.0 + expected_disp)).abs() < 1e-12);
    }

    #[test]
    fn test_bspline_transform_3d() {
        let mut t = BSplineTransform::<3>::new([4, 4, 4], Point::origin(), Spacing::uniform(10.0)).unwrap();
        let mut coefficients = vec![0.0; t.number_of_parameters()];
        for k in 0..3 {
            coefficients[t.parameter_index(k, [1, 1, 1])] = 1.0;
        }
        t.set_parameters(&coefficients).unwrap();

        let transformed = t.transform_point(&Point::new([10.0, 10.0, 10.0])).unwrap();
        let weight = 8.0 / 27.0;
        for k in 0..3 {
            assert!((transformed[k] - (10.0 + weight)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_out_of_domain() {
        let t = grid_2d();
        for p in [[5.0, 15.0], [15.0, 20.5], [f64::NAN, 15.0]] {
            let err = t.transform_point(&Point::new(p)).unwrap_err();
            assert!(err.is_domain_failure(), "{:?} should be outside", p);
            assert!(t.spatial_hessian_and_jacobian(&Point::new(p)).is_err());
        }
        // Both edges of the valid region are inside.
        assert!(t.transform_point(&Point::new([10.0, 20.0])).is_ok());
    }

    #[test]
    fn test_upper_edge_uses_last_window() {
        let t = grid_2d();
        let indices = t.nonzero_jacobian_indices(&Point::new([20.0, 20.0])).unwrap();
        // 4x4 grid has exactly one window.
        assert_eq!(indices, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn test_identity_with_zero_coefficients() {
        let t = grid_2d();
        let p = Point::new([13.0, 17.5]);
        assert_eq!(t.transform_point(&p).unwrap(), p);
        assert_eq!(t.spatial_jacobian(&p).unwrap(), SpatialJacobian::<2>::identity());
        assert_eq!(t.spatial_hessian(&p).unwrap(), zero_spatial_hessian::<2>());
    }

    #[test]
    fn test_partition_of_unity() {
        // Constant coefficients give a pure translation with zero Hessian.
        let t = grid_2d();
        let ncp = t.number_of_control_points();
        let mut coefficients = vec![0.0; 2 * ncp];
        coefficients[..ncp].iter_mut().for_each(|c| *c = 2.0);
        let t = t.with_coefficients(&coefficients).unwrap();

        let p = Point::new([12.3, 18.9]);
        let q = t.transform_point(&p).unwrap();
        assert!((q[0] - (p[0] + 2.0)).abs() < 1e-12);
        assert!((q[1] - p[1]).abs() < 1e-12);
        let sh = t.spatial_hessian(&p).unwrap();
        assert!(sh.iter().all(|h| h.norm() < 1e-12));
    }

    #[test]
    fn test_nonzero_indices_consistent() {
        let t = wavy_2d();
        let p = Point::new([3.1, 4.7]);
        let from_jacobian = t.jacobian(&p).unwrap().nonzero_indices;
        let from_jsj = t.jacobian_of_spatial_jacobian(&p).unwrap().nonzero_indices;
        let from_jsh = t.jacobian_of_spatial_hessian(&p).unwrap().nonzero_indices;
        let direct = t.nonzero_jacobian_indices(&p).unwrap();

        assert_eq!(from_jacobian, from_jsj);
        assert_eq!(from_jacobian, from_jsh);
        assert_eq!(from_jacobian, direct);
        assert_eq!(from_jacobian.len(), t.number_of_nonzero_jacobian_indices());
        assert!(is_strictly_increasing(&from_jacobian));
    }

    #[test]
    fn test_spatial_jacobian_matches_finite_differences() {
        let t = wavy_2d();
        let p = Point::new([3.1, 4.7]);
        let sj = t.spatial_jacobian(&p).unwrap();
        let h = 1e-6;
        for i in 0..2 {
            let mut plus = p;
            let mut minus = p;
            plus[i] += h;
            minus[i] -= h;
            let tp = t.transform_point(&plus).unwrap();
            let tm = t.transform_point(&minus).unwrap();
            for k in 0..2 {
                let fd = (tp[k] - tm[k]) / (2.0 * h);
                assert!((sj[(k, i)] - fd).abs() < 1e-6, "sj[{k},{i}] {} vs {}", sj[(k, i)], fd);
            }
        }
    }

    #[test]
    fn test_spatial_hessian_matches_finite_differences() {
        let t = wavy_2d();
        let p = Point::new([3.1, 4.7]);
        let sh = t.spatial_hessian(&p).unwrap();
        let h = 1e-5;
        for j in 0..2 {
            let mut plus = p;
            let mut minus = p;
            plus[j] += h;
            minus[j] -= h;
            let sp = t.spatial_jacobian(&plus).unwrap();
            let sm = t.spatial_jacobian(&minus).unwrap();
            for k in 0..2 {
                for i in 0..2 {
                    let fd = (sp[(k, i)] - sm[(k, i)]) / (2.0 * h);
                    assert!((sh[k][(i, j)] - fd).abs() < 1e-5);
                }
            }
        }
        for component in sh.iter() {
            assert!((component - component.transpose()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_parameter_derivatives_match_perturbation() {
        let t = wavy_2d();
        let p = Point::new([3.1, 4.7]);
        let (sh, jsh) = t.spatial_hessian_and_jacobian(&p).unwrap();
        let (sj, jsj) = t.spatial_jacobian_and_jacobian(&p).unwrap();
        let jacobian = t.jacobian(&p).unwrap();
        let base = t.parameters();
        let x0 = t.transform_point(&p).unwrap();

        // Everything is linear in the coefficients, so a unit step is exact.
        for (n, &index) in jsh.nonzero_indices.iter().enumerate().step_by(5) {
            let mut shifted = base.clone();
            shifted[index] += 1.0;
            let moved = BSplineTransform::<2>::new([6, 5], Point::new([-2.0, -1.0]), Spacing::new([2.0, 3.0]))
                .unwrap()
                .with_coefficients(&shifted)
                .unwrap();

            let sh1 = moved.spatial_hessian(&p).unwrap();
            let sj1 = moved.spatial_jacobian(&p).unwrap();
            let x1 = moved.transform_point(&p).unwrap();
            for k in 0..2 {
                assert!((sh1[k] - sh[k] - jsh.values[n][k]).norm() < 1e-10);
                assert!((x1[k] - x0[k] - jacobian.values[(k, n)]).abs() < 1e-10);
            }
            assert!((sj1 - sj - jsj.values[n]).norm() < 1e-10);
        }
    }

    #[test]
    fn test_covering_region() {
        let t = BSplineTransform::<2>::covering(
            Point::new([0.0, 0.0]),
            [20.0, 7.0],
            Spacing::uniform(5.0),
        )
        .unwrap();
        assert_eq!(t.grid_size(), [7, 5]);
        for p in [[0.0, 0.0], [20.0, 7.0], [20.0, 0.0], [11.3, 3.3]] {
            assert!(t.transform_point(&Point::new(p)).is_ok(), "{:?} should be covered", p);
        }
    }

    #[test]
    fn test_covering_edges_with_inexact_spacing() {
        let cases = [(0.7, 0.3, 0.1), (1.1, 0.6, 0.2), (-2.3, 1.7, 0.3), (0.1, 0.7, 0.7)];
        for (origin, size, spacing) in cases {
            let t = BSplineTransform::<1>::covering(Point::new([origin]), [size], Spacing::uniform(spacing)).unwrap();
            for x in [origin, origin + size] {
                assert!(t.transform_point(&Point::new([x])).is_ok(), "{} should be covered", x);
                assert!(t.spatial_hessian(&Point::new([x])).is_ok());
            }
        }
        let t = BSplineTransform::<1>::covering(Point::new([0.7]), [0.3], Spacing::uniform(0.1)).unwrap();
        assert!(t.transform_point(&Point::new([0.69])).is_err());
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let mut t = grid_2d();
        let err = t.set_parameters(&[0.0; 3]).unwrap_err();
        assert_eq!(err, TransformError::ParameterCountMismatch { expected: 32, actual: 3 });
    }
}
