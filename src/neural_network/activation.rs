use crate::ModelError;
use crate::neural_network::Tensor;
use crate::neural_network::layer::ActivationLayer;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Threshold (in number of elements) above which activations are applied in parallel
const ACTIVATION_PARALLEL_THRESHOLD: usize = 10_000;

/// Activation function enum, supporting ReLU, Tanh and Sigmoid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    ReLU,
    Tanh,
    Sigmoid,
}

impl Activation {
    /// Applies the activation function element-wise.
    ///
    /// # Parameters
    ///
    /// * `z` - Input tensor to apply the activation function to
    ///
    /// # Returns
    ///
    /// * `Tensor` - A new tensor with the activation function applied
    pub fn apply(&self, z: &Tensor) -> Tensor {
        let f: fn(f32) -> f32 = match self {
            Activation::ReLU => |x| if x > 0.0 { x } else { 0.0 },
            Activation::Tanh => |x| x.tanh(),
            Activation::Sigmoid => |x| 1.0 / (1.0 + (-x).exp()),
        };

        let mut result = z.clone();
        if result.len() >= ACTIVATION_PARALLEL_THRESHOLD {
            result.par_mapv_inplace(f);
        } else {
            result.mapv_inplace(f);
        }
        result
    }

    /// Computes the derivative of the activation given its output.
    ///
    /// # Parameters
    ///
    /// * `activation_output` - The output after the activation function has been applied
    ///
    /// # Returns
    ///
    /// * `Tensor` - A tensor containing the derivative values
    pub fn derivative(&self, activation_output: &Tensor) -> Tensor {
        match self {
            Activation::ReLU => activation_output.mapv(|a| if a > 0.0 { 1.0 } else { 0.0 }),
            Activation::Tanh => activation_output.mapv(|a| 1.0 - a * a),
            Activation::Sigmoid => activation_output.mapv(|a| a * (1.0 - a)),
        }
    }

    /// Creates a stand-alone layer applying this activation.
    pub fn layer(self) -> ActivationLayer {
        ActivationLayer::new(self)
    }

    /// Lower-case name of the activation, as accepted by [`get_activation_module`]
    pub fn name(&self) -> &'static str {
        match self {
            Activation::ReLU => "relu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::ReLU => "ReLU",
            Activation::Tanh => "Tanh",
            Activation::Sigmoid => "Sigmoid",
        };
        f.write_str(name)
    }
}

impl FromStr for Activation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relu" => Ok(Activation::ReLU),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            _ => Err(ModelError::UnrecognizedConfig(format!(
                "Unknown activation type: {}",
                s
            ))),
        }
    }
}

/// Looks up an activation function by name.
///
/// The lookup is case-insensitive: `"relu"`, `"ReLU"` and `"RELU"` all select
/// [`Activation::ReLU`].
///
/// # Parameters
///
/// * `name` - One of `relu`, `tanh`, `sigmoid` in any letter case
///
/// # Returns
///
/// - `Ok(Activation)` - The matching activation
/// - `Err(ModelError::UnrecognizedConfig)` - If the name is not a supported activation
///
/// # Examples
/// ```rust
/// use model_factory::neural_network::{get_activation_module, Activation};
///
/// assert_eq!(get_activation_module("Tanh").unwrap(), Activation::Tanh);
/// assert!(get_activation_module("gelu").is_err());
/// ```
pub fn get_activation_module(name: &str) -> Result<Activation, ModelError> {
    name.parse()
}
