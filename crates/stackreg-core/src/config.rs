//! Serializable stack configuration.
//!
//! The configuration is established once before a registration run and
//! describes the element transforms of a stack and its geometry along the
//! stacking axis.

use serde::{Deserialize, Serialize};

/// Description of one stack element.
///
/// `transform` names a constructor in a
/// [`TransformRegistry`](crate::transform::TransformRegistry). Grid fields are
/// only read by grid-based transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub transform: String,
    #[serde(default)]
    pub grid_size: Vec<usize>,
    #[serde(default)]
    pub grid_origin: Vec<f64>,
    #[serde(default)]
    pub grid_spacing: Vec<f64>,
    /// Initial parameters; zeros when absent.
    #[serde(default)]
    pub parameters: Option<Vec<f64>>,
}

impl ElementSpec {
    /// Cubic B-Spline element on the given control grid.
    pub fn bspline(grid_size: Vec<usize>, grid_origin: Vec<f64>, grid_spacing: Vec<f64>) -> Self {
        Self {
            transform: "BSplineTransform".to_string(),
            grid_size,
            grid_origin,
            grid_spacing,
            parameters: None,
        }
    }

    /// Translation element.
    pub fn translation() -> Self {
        Self {
            transform: "TranslationTransform".to_string(),
            grid_size: Vec::new(),
            grid_origin: Vec::new(),
            grid_spacing: Vec::new(),
            parameters: None,
        }
    }

    /// Set initial parameters.
    pub fn with_parameters(mut self, parameters: Vec<f64>) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

fn default_stack_spacing() -> f64 {
    1.0
}

/// Stack geometry and elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Last-axis coordinate of element 0.
    #[serde(default)]
    pub stack_origin: f64,
    /// Last-axis distance between consecutive elements.
    #[serde(default = "default_stack_spacing")]
    pub stack_spacing: f64,
    /// Expected total parameter count, checked against the elements.
    #[serde(default)]
    pub number_of_parameters: Option<usize>,
    pub elements: Vec<ElementSpec>,
}

impl StackConfig {
    /// Create a configuration with unit spacing starting at 0.
    pub fn new(elements: Vec<ElementSpec>) -> Self {
        Self {
            stack_origin: 0.0,
            stack_spacing: default_stack_spacing(),
            number_of_parameters: None,
            elements,
        }
    }

    /// `count` copies of the same element.
    pub fn uniform(element: ElementSpec, count: usize) -> Self {
        Self::new(vec![element; count])
    }

    /// Set origin and spacing along the stacking axis.
    pub fn with_stack_geometry(mut self, origin: f64, spacing: f64) -> Self {
        self.stack_origin = origin;
        self.stack_spacing = spacing;
        self
    }

    /// Declare the expected total parameter count.
    pub fn with_number_of_parameters(mut self, count: usize) -> Self {
        self.number_of_parameters = Some(count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_config() {
        let config = StackConfig::uniform(ElementSpec::translation(), 3).with_stack_geometry(1.0, 2.5);
        assert_eq!(config.elements.len(), 3);
        assert_eq!(config.stack_origin, 1.0);
        assert_eq!(config.stack_spacing, 2.5);
        assert_eq!(config.number_of_parameters, None);
    }

    #[test]
    fn test_builder_parameters() {
        let spec = ElementSpec::translation().with_parameters(vec![1.0, 2.0]);
        assert_eq!(spec.parameters, Some(vec![1.0, 2.0]));
        assert_eq!(spec.transform, "TranslationTransform");
    }
}
