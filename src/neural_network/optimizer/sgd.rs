use crate::ModelError;
use crate::neural_network::{Layer, Optimizer};
use ndarray::{Array2, Zip};

/// Stochastic Gradient Descent (SGD) optimizer.
///
/// A simple optimization algorithm that updates parameters in the direction
/// of the negative gradient, scaled by the learning rate.
///
/// # Fields
///
/// * `learning_rate` - Learning rate controlling the size of parameter updates
pub struct SGD {
    learning_rate: f32,
}

impl SGD {
    /// Creates a new SGD optimizer with the specified learning rate.
    ///
    /// # Parameters
    ///
    /// * `learning_rate` - Step size for parameter updates
    ///
    /// # Returns
    ///
    /// - `Ok(SGD)` - A new SGD optimizer instance
    /// - `Err(ModelError::InputValidationError)` - If the learning rate is not positive and finite
    pub fn new(learning_rate: f32) -> Result<Self, ModelError> {
        if !(learning_rate > 0.0 && learning_rate.is_finite()) {
            return Err(ModelError::InputValidationError(format!(
                "Learning rate must be positive and finite, got {}",
                learning_rate
            )));
        }
        Ok(Self { learning_rate })
    }

    get_field!(get_learning_rate, learning_rate, f32);

    /// Simultaneously update weights and bias in parallel
    ///
    /// # Parameters
    ///
    /// - `weights` - Weights to be updated
    /// - `weight_grads` - Weight gradients
    /// - `bias` - Bias to be updated
    /// - `bias_grads` - Bias gradients
    /// - `lr` - Learning rate
    pub fn update_sgd_parameters(
        weights: &mut Array2<f32>,
        weight_grads: &Array2<f32>,
        bias: &mut Array2<f32>,
        bias_grads: &Array2<f32>,
        lr: f32,
    ) {
        rayon::join(
            || {
                Zip::from(weights)
                    .and(weight_grads)
                    .par_for_each(|w, &wg| *w -= wg * lr)
            },
            || {
                Zip::from(bias)
                    .and(bias_grads)
                    .par_for_each(|b, &bg| *b -= bg * lr)
            },
        );
    }
}

impl Optimizer for SGD {
    fn update(&mut self, layer: &mut dyn Layer) {
        // Directly call the layer's parameter update method
        layer.update_parameters_sgd(self.learning_rate);
    }
}
