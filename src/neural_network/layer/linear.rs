use crate::ModelError;
use crate::neural_network::optimizer::SGD;
use crate::neural_network::{Layer, Tensor, as_2d};
use ndarray::{Array, Array2, ArrayView2, Axis};
use ndarray_rand::RandomExt;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand_distr::Uniform;

/// Linear (fully connected) layer without activation.
///
/// Performs `output = input · weights + bias`. Weights and bias are initialized from
/// `U(-1/√input_dim, 1/√input_dim)` using a seeded generator, so two layers built with the
/// same seed start from identical parameters.
///
/// The weight matrix is stored with one column per output unit. The constraint helpers
/// ([`Linear::clamp_weights_min`], [`Linear::clamp_unit_weights_min`],
/// [`Linear::zero_unit_weights`]) operate in place on those columns and leave the bias
/// untouched.
///
/// # Dimensions
///
/// - Input shape: (batch_size, input_dim)
/// - Output shape: (batch_size, output_dim)
///
/// # Fields
/// ## Core fields
/// - `input_dim` - Input dimension size
/// - `output_dim` - Output dimension size
/// - `weights` - Weight matrix with shape (input_dim, output_dim)
/// - `bias` - Bias vector with shape (1, output_dim)
///
/// ## Cache
/// - `input_cache` - Cache of the input from forward pass for use in backward pass
/// - `grad_weights` - Stored weight gradients
/// - `grad_bias` - Stored bias gradients
///
/// # Example
/// ```rust
/// use model_factory::prelude::*;
/// use ndarray::Array;
///
/// let mut linear = Linear::new(4, 2, 10).unwrap();
/// let x = Array::ones((3, 4)).into_dyn();
/// let y = linear.forward(&x).unwrap();
/// assert_eq!(y.shape(), &[3, 2]);
/// ```
pub struct Linear {
    input_dim: usize,
    output_dim: usize,
    weights: Array2<f32>,
    bias: Array2<f32>,
    input_cache: Option<Array2<f32>>,
    grad_weights: Option<Array2<f32>>,
    grad_bias: Option<Array2<f32>>,
}

impl Linear {
    /// Creates a new linear layer with seeded uniform initialization.
    ///
    /// # Parameters
    ///
    /// - `input_dim` - Number of input features
    /// - `output_dim` - Number of output units
    /// - `seed` - Seed for the weight and bias initializer
    ///
    /// # Returns
    ///
    /// - `Ok(Linear)` - A new layer
    /// - `Err(ModelError::InputValidationError)` - If either dimension is zero
    pub fn new(input_dim: usize, output_dim: usize, seed: u64) -> Result<Self, ModelError> {
        if input_dim == 0 || output_dim == 0 {
            return Err(ModelError::InputValidationError(format!(
                "Linear layer dimensions must be positive, got input_dim={} output_dim={}",
                input_dim, output_dim
            )));
        }

        let bound = 1.0 / (input_dim as f32).sqrt();
        let mut rng = StdRng::seed_from_u64(seed);
        let weights = Array::random_using(
            (input_dim, output_dim),
            Uniform::new(-bound, bound),
            &mut rng,
        );
        let bias = Array::random_using((1, output_dim), Uniform::new(-bound, bound), &mut rng);

        Ok(Self {
            input_dim,
            output_dim,
            weights,
            bias,
            input_cache: None,
            grad_weights: None,
            grad_bias: None,
        })
    }

    /// Creates a linear layer from explicit parameters.
    ///
    /// # Parameters
    ///
    /// - `weights` - Weight matrix with shape (input_dim, output_dim)
    /// - `bias` - Bias with shape (1, output_dim)
    ///
    /// # Returns
    ///
    /// - `Ok(Linear)` - A new layer
    /// - `Err(ModelError::InputValidationError)` - If the shapes are inconsistent or empty
    pub fn from_weights(weights: Array2<f32>, bias: Array2<f32>) -> Result<Self, ModelError> {
        let (input_dim, output_dim) = weights.dim();
        if input_dim == 0 || output_dim == 0 {
            return Err(ModelError::InputValidationError(
                "Weight matrix must not be empty".to_string(),
            ));
        }
        if bias.dim() != (1, output_dim) {
            return Err(ModelError::InputValidationError(format!(
                "Bias shape {:?} does not match (1, {})",
                bias.shape(),
                output_dim
            )));
        }

        Ok(Self {
            input_dim,
            output_dim,
            weights,
            bias,
            input_cache: None,
            grad_weights: None,
            grad_bias: None,
        })
    }

    get_field!(get_input_dim, input_dim, usize);
    get_field!(get_output_dim, output_dim, usize);
    get_field_as_ref!(get_weights, weights, &Array2<f32>);
    get_field_as_ref!(get_bias, bias, &Array2<f32>);

    /// Gradient of the weights from the last backward pass, if any
    pub fn get_grad_weights(&self) -> Option<&Array2<f32>> {
        self.grad_weights.as_ref()
    }

    /// Gradient of the bias from the last backward pass, if any
    pub fn get_grad_bias(&self) -> Option<&Array2<f32>> {
        self.grad_bias.as_ref()
    }

    /// Replaces the layer parameters.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - If the new parameters have the layer's shapes
    /// - `Err(ModelError::InputValidationError)` - Otherwise
    pub fn set_weights(&mut self, weights: Array2<f32>, bias: Array2<f32>) -> Result<(), ModelError> {
        if weights.dim() != (self.input_dim, self.output_dim) || bias.dim() != (1, self.output_dim)
        {
            return Err(ModelError::InputValidationError(format!(
                "Expected weights {:?} and bias {:?}, got {:?} and {:?}",
                (self.input_dim, self.output_dim),
                (1, self.output_dim),
                weights.shape(),
                bias.shape()
            )));
        }
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    /// Raises every weight below `min` to `min`
    pub fn clamp_weights_min(&mut self, min: f32) {
        self.weights.mapv_inplace(|w| w.max(min));
    }

    /// Raises the weights of output unit `unit` below `min` to `min`.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - On success
    /// - `Err(ModelError::InputValidationError)` - If `unit` is not an output unit of this layer
    pub fn clamp_unit_weights_min(&mut self, unit: usize, min: f32) -> Result<(), ModelError> {
        self.check_unit(unit)?;
        self.weights
            .column_mut(unit)
            .mapv_inplace(|w| w.max(min));
        Ok(())
    }

    /// Sets all weights of output unit `unit` to zero.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - On success
    /// - `Err(ModelError::InputValidationError)` - If `unit` is not an output unit of this layer
    pub fn zero_unit_weights(&mut self, unit: usize) -> Result<(), ModelError> {
        self.check_unit(unit)?;
        self.weights.column_mut(unit).fill(0.0);
        Ok(())
    }

    fn check_unit(&self, unit: usize) -> Result<(), ModelError> {
        if unit >= self.output_dim {
            return Err(ModelError::InputValidationError(format!(
                "Output unit {} out of range for a layer with {} outputs",
                unit, self.output_dim
            )));
        }
        Ok(())
    }

    /// Forward pass over a 2D batch, caching the input for the backward pass.
    ///
    /// # Returns
    ///
    /// - `Ok(Array2<f32>)` - Output of shape (batch_size, output_dim)
    /// - `Err(ModelError::InputValidationError)` - If the feature count does not match `input_dim`
    pub fn forward_2d(&mut self, input: ArrayView2<f32>) -> Result<Array2<f32>, ModelError> {
        if input.ncols() != self.input_dim {
            return Err(ModelError::InputValidationError(format!(
                "Linear layer expects {} input features, got {}",
                self.input_dim,
                input.ncols()
            )));
        }

        self.input_cache = Some(input.to_owned());

        // ndarray runs the matrix product in parallel when the rayon feature is enabled
        Ok(input.dot(&self.weights) + &self.bias)
    }

    /// Backward pass over a 2D upstream gradient.
    ///
    /// Stores the weight and bias gradients and returns the gradient with respect to the input.
    pub fn backward_2d(&mut self, grad_output: ArrayView2<f32>) -> Result<Array2<f32>, ModelError> {
        let input = match &self.input_cache {
            Some(input) => input,
            None => Err(ModelError::ProcessingError(String::from(
                "Forward pass has not been run",
            )))?,
        };

        if grad_output.dim() != (input.nrows(), self.output_dim) {
            return Err(ModelError::ProcessingError(format!(
                "Gradient output shape {:?} doesn't match expected {:?}",
                grad_output.shape(),
                (input.nrows(), self.output_dim)
            )));
        }

        self.grad_weights = Some(input.t().dot(&grad_output));
        self.grad_bias = Some(grad_output.sum_axis(Axis(0)).insert_axis(Axis(0)));
        self.input_cache = None;

        Ok(grad_output.dot(&self.weights.t()))
    }
}

impl Layer for Linear {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, ModelError> {
        let input_2d = as_2d(input, "input")?;
        Ok(self.forward_2d(input_2d)?.into_dyn())
    }

    fn backward(&mut self, grad_output: &Tensor) -> Result<Tensor, ModelError> {
        let grad_2d = as_2d(grad_output, "grad_output")?;
        Ok(self.backward_2d(grad_2d)?.into_dyn())
    }

    fn layer_type(&self) -> &str {
        "Linear"
    }

    fn output_shape(&self) -> String {
        format!("(None, {})", self.output_dim)
    }

    fn param_count(&self) -> usize {
        self.input_dim * self.output_dim + self.output_dim
    }

    fn update_parameters_sgd(&mut self, lr: f32) {
        if let (Some(grad_w), Some(grad_b)) = (&self.grad_weights, &self.grad_bias) {
            SGD::update_sgd_parameters(&mut self.weights, grad_w, &mut self.bias, grad_b, lr);
        }
    }
}
