use burn::tensor::Tensor;
use burn_ndarray::NdArray;
use stackreg_core::config::{ElementSpec, StackConfig};
use stackreg_core::spatial::Point;
use stackreg_core::transform::{
    transform_points_tensor, SparseDerivativeTransform, StackTransform, TransformKind,
    TransformRegistry,
};
use stackreg_core::TransformError;

type B = NdArray<f32>;

fn slice_spec() -> ElementSpec {
    ElementSpec::bspline(vec![5, 5], vec![-1.0, -1.0], vec![1.0, 1.0])
}

#[test]
fn test_stack_from_config() {
    let registry = TransformRegistry::<2>::with_defaults();
    let config = StackConfig::new(vec![slice_spec(), ElementSpec::translation(), slice_spec()])
        .with_stack_geometry(10.0, 2.0)
        .with_number_of_parameters(50 + 2 + 50);

    let stack = StackTransform::<3, 2>::from_config(&config, &registry).unwrap();
    assert_eq!(stack.number_of_elements(), 3);
    assert_eq!(stack.number_of_parameters(), 102);
    assert_eq!(stack.element(1).unwrap().kind(), TransformKind::Translation);
    assert_eq!(stack.layout().offset(2), 52);
    assert_eq!(stack.element_index(13.0).unwrap(), 2);
}

#[test]
fn test_declared_parameter_count_must_match() {
    let registry = TransformRegistry::<2>::with_defaults();
    let config = StackConfig::uniform(slice_spec(), 2).with_number_of_parameters(99);
    let err = StackTransform::<3, 2>::from_config(&config, &registry).unwrap_err();
    assert!(matches!(err, TransformError::InvalidConfiguration(_)));
}

#[test]
fn test_unknown_element_transform() {
    let registry = TransformRegistry::<2>::with_defaults();
    let mut spec = slice_spec();
    spec.transform = "EulerTransform".to_string();
    let err = StackTransform::<3, 2>::from_config(&StackConfig::new(vec![spec]), &registry).unwrap_err();
    assert!(matches!(err, TransformError::UnknownTransform(_)));
}

#[test]
fn test_initial_parameters_from_config() {
    let registry = TransformRegistry::<1>::with_defaults();
    let config = StackConfig::new(vec![
        ElementSpec::translation().with_parameters(vec![0.5]),
        ElementSpec::translation().with_parameters(vec![-0.5]),
    ]);
    let stack = StackTransform::<2, 1>::from_config(&config, &registry).unwrap();
    assert_eq!(stack.parameters(), vec![0.5, -0.5]);

    let mapped = stack.transform_point(&Point::new([1.0, 1.0])).unwrap();
    assert_eq!(mapped, Point::new([0.5, 1.0]));
}

#[test]
fn test_stack_tensor_batch() {
    let registry = TransformRegistry::<1>::with_defaults();
    let config = StackConfig::new(vec![
        ElementSpec::translation().with_parameters(vec![1.0]),
        ElementSpec::translation().with_parameters(vec![2.0]),
    ]);
    let stack = StackTransform::<2, 1>::from_config(&config, &registry).unwrap();

    let device = Default::default();
    let points = Tensor::<B, 2>::from_floats([[0.0, 0.0], [0.0, 1.0]], &device);
    let transformed = transform_points_tensor(&stack, points).unwrap();
    let result = transformed.into_data();
    let actual = result.as_slice::<f32>().unwrap();
    assert_eq!(actual, &[1.0, 0.0, 2.0, 1.0]);
}
