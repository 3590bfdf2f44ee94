//! Tensor batch adapter.
//!
//! Moves point batches between burn tensors of shape `[N, D]` and
//! [`Point`] values so that tensor-based callers can drive the point-wise
//! transform contract.

use burn::tensor::{backend::Backend, Shape, Tensor, TensorData};
use crate::error::{Result, TransformError};
use crate::spatial::Point;
use super::trait_::SparseDerivativeTransform;

/// Read a `[N, D]` tensor as a list of points.
pub fn points_from_tensor<B: Backend, const D: usize>(points: Tensor<B, 2>) -> Result<Vec<Point<D>>> {
    let [n, d] = points.dims();
    if d != D {
        return Err(TransformError::dimension_mismatch(format!(
            "point tensor has shape [{}, {}], expected [N, {}]",
            n, d, D
        )));
    }

    let values = points
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| TransformError::invalid_configuration(format!("unreadable point tensor: {:?}", e)))?;

    Ok(values.chunks_exact(D).map(|row| Point::from_fn(|i| row[i])).collect())
}

/// Write points into a `[N, D]` tensor on `device`.
pub fn points_to_tensor<B: Backend, const D: usize>(points: &[Point<D>], device: &B::Device) -> Tensor<B, 2> {
    let values: Vec<f64> = points.iter().flat_map(|p| p.to_array()).collect();
    let data = TensorData::new(values, Shape::new([points.len(), D])).convert::<B::FloatElem>();
    Tensor::<B, 2>::from_data(data, device)
}

/// Map every row of a `[N, D]` tensor through `transform`.
///
/// Fails on the first point outside the transform's domain.
pub fn transform_points_tensor<B, T, const D: usize>(transform: &T, points: Tensor<B, 2>) -> Result<Tensor<B, 2>>
where
    B: Backend,
    T: SparseDerivativeTransform<D> + ?Sized,
{
    let device = points.device();
    let input = points_from_tensor::<B, D>(points)?;
    let output = input
        .iter()
        .map(|p| transform.transform_point(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(points_to_tensor::<B, D>(&output, &device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use crate::spatial::{Spacing, Vector};
    use crate::transform::{BSplineTransform, TranslationTransform};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_translation_batch() {
        let device = Default::default();
        let transform = TranslationTransform::new(Vector::new([1.0, -2.0]));
        let points = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0], [1.5, 2.0]], &device);

        let transformed = transform_points_tensor(&transform, points).unwrap();
        assert_eq!(transformed.dims(), [2, 2]);
        let data = transformed.into_data();
        let slice = data.as_slice::<f32>().unwrap();
        assert_eq!(slice, &[1.0, -2.0, 2.5, 0.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let device = Default::default();
        let transform = TranslationTransform::new(Vector::new([1.0, 1.0, 1.0]));
        let points = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0]], &device);
        assert!(matches!(
            transform_points_tensor(&transform, points),
            Err(TransformError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_out_of_domain_point_fails() {
        let device = Default::default();
        let transform = BSplineTransform::<2>::new([5, 5], Point::new([0.0, 0.0]), Spacing::uniform(1.0)).unwrap();
        let points = Tensor::<TestBackend, 2>::from_floats([[2.0, 2.0], [10.0, 2.0]], &device);
        let result = transform_points_tensor(&transform, points);
        assert!(matches!(result, Err(TransformError::OutOfDomain { .. })));
    }

    #[test]
    fn test_points_round_trip() {
        let device = Default::default();
        let points = vec![Point::new([0.5, 1.0, 2.0]), Point::new([3.0, 4.0, 5.0])];
        let tensor = points_to_tensor::<TestBackend, 3>(&points, &device);
        assert_eq!(points_from_tensor::<TestBackend, 3>(tensor).unwrap(), points);
    }
}
