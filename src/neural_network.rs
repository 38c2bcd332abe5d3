/// Activation functions selectable by name
pub mod activation;
/// The closed set of comparison criteria
pub mod criterion;
/// Layers: linear projection and stand-alone activation layers
pub mod layer;
/// Loss functions used by the criteria
pub mod loss_function;
/// The configurable model base that dispatches on the criterion
pub mod model_base;
/// Optimizers that update layer parameters
pub mod optimizer;
/// One output head per criterion
pub mod output_head;
/// Batches laid out as positive pairs followed by negative pairs
pub mod pair_batch;
/// Row normalization and cosine similarity
pub mod similarity;

pub use activation::*;
pub use criterion::*;
pub use layer::*;
pub use loss_function::*;
pub use model_base::*;
pub use optimizer::*;
pub use output_head::*;
pub use pair_batch::*;
pub use similarity::*;

use crate::ModelError;
use ndarray::{ArrayD, Axis, Ix1, Ix2};

/// Type alias for n-dimensional arrays used as tensors in the neural network
pub type Tensor = ArrayD<f32>;

pub use crate::traits::Layer;
pub use crate::traits::LossFunction;
pub use crate::traits::Optimizer;

/// Views a tensor as a 2D `(batch, features)` matrix.
///
/// # Parameters
///
/// - `tensor` - The tensor to view
/// - `name` - Name used in the error message
///
/// # Returns
///
/// - `Ok(ArrayView2<f32>)` - A 2D view of the tensor
/// - `Err(ModelError::InputValidationError)` - If the tensor does not have exactly two dimensions
pub(crate) fn as_2d<'a>(
    tensor: &'a Tensor,
    name: &str,
) -> Result<ndarray::ArrayView2<'a, f32>, ModelError> {
    tensor.view().into_dimensionality::<Ix2>().map_err(|_| {
        ModelError::InputValidationError(format!(
            "`{}` must be two-dimensional (batch, features), got shape {:?}",
            name,
            tensor.shape()
        ))
    })
}

/// Views a tensor as a 1D vector with one entry per batch row.
///
/// A `(batch, 1)` column is accepted as well.
pub(crate) fn as_1d<'a>(
    tensor: &'a Tensor,
    name: &str,
) -> Result<ndarray::ArrayView1<'a, f32>, ModelError> {
    match tensor.ndim() {
        1 => tensor.view().into_dimensionality::<Ix1>().map_err(|e| {
            ModelError::ProcessingError(format!("Failed to view `{}` as 1D: {}", name, e))
        }),
        2 if tensor.shape()[1] == 1 => tensor
            .index_axis(Axis(1), 0)
            .into_dimensionality::<Ix1>()
            .map_err(|e| {
                ModelError::ProcessingError(format!("Failed to view `{}` as 1D: {}", name, e))
            }),
        _ => Err(ModelError::InputValidationError(format!(
            "`{}` must have shape (batch,) or (batch, 1), got {:?}",
            name,
            tensor.shape()
        ))),
    }
}
