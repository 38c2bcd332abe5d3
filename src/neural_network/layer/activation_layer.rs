use crate::ModelError;
use crate::neural_network::{Activation, Layer, Tensor};
use ndarray::Zip;

/// Layer applying an [`Activation`] element-wise, keeping the input shape.
///
/// The activated output is cached during the forward pass so that the backward pass can
/// evaluate the derivative from it.
///
/// # Examples
///
/// ```rust
/// use model_factory::prelude::*;
/// use ndarray::array;
///
/// let mut layer = get_activation_module("relu").unwrap().layer();
/// let output = layer.forward(&array![[-1.0f32, 2.0]].into_dyn()).unwrap();
/// assert_eq!(output, array![[0.0f32, 2.0]].into_dyn());
/// ```
pub struct ActivationLayer {
    activation: Activation,
    output_cache: Option<Tensor>,
}

impl ActivationLayer {
    /// Creates a new activation layer.
    pub fn new(activation: Activation) -> Self {
        Self {
            activation,
            output_cache: None,
        }
    }

    get_field!(activation, activation, Activation);
}

impl Layer for ActivationLayer {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, ModelError> {
        if input.is_empty() {
            return Err(ModelError::InputValidationError(
                "Input tensor is empty".to_string(),
            ));
        }

        if input.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::InputValidationError(
                "Input tensor contains NaN or infinite values".to_string(),
            ));
        }

        let output = self.activation.apply(input);
        self.output_cache = Some(output.clone());
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor, ModelError> {
        let output = match &self.output_cache {
            Some(output) => output,
            None => Err(ModelError::ProcessingError(String::from(
                "Forward pass has not been run",
            )))?,
        };

        if grad_output.shape() != output.shape() {
            return Err(ModelError::ProcessingError(format!(
                "Gradient output shape {:?} doesn't match activation output shape {:?}",
                grad_output.shape(),
                output.shape()
            )));
        }

        let mut grad_input = self.activation.derivative(output);
        Zip::from(&mut grad_input)
            .and(grad_output)
            .for_each(|g, &up| *g *= up);
        self.output_cache = None;

        Ok(grad_input)
    }

    fn layer_type(&self) -> &str {
        match self.activation {
            Activation::ReLU => "ReLU",
            Activation::Tanh => "Tanh",
            Activation::Sigmoid => "Sigmoid",
        }
    }

    fn output_shape(&self) -> String {
        match &self.output_cache {
            Some(output) => format!("{:?}", output.shape()),
            None => String::from("Unknown"),
        }
    }
}
