use crate::ModelError;
use crate::neural_network::{LossFunction, Tensor, as_1d, as_2d};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Cross-entropy loss over raw scores (logits) with integer class targets.
///
/// The logits are passed through a numerically stable softmax internally, so the head does
/// not apply one itself. Targets hold one class index per row, stored as `f32`
/// (e.g. `0.0` or `1.0` for the two-class heads).
///
/// # Example
///
/// ```rust
/// use model_factory::prelude::*;
/// use ndarray::array;
///
/// let ce = CrossEntropy::new();
/// let logits = array![[-2.0f32, 2.0], [3.0, -3.0]].into_dyn();
/// let targets = array![1.0f32, 0.0].into_dyn();
/// let loss = ce.compute_loss(&targets, &logits).unwrap();
/// assert!(loss < 0.05);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Creates a new instance of CrossEntropy
    pub fn new() -> Self {
        Self
    }
}

/// Validates targets against the logits and converts them to class indices
fn class_indices(
    y_true: ArrayView1<f32>,
    logits: ArrayView2<f32>,
) -> Result<Vec<usize>, ModelError> {
    let (batch_size, n_classes) = logits.dim();

    if batch_size == 0 {
        return Err(ModelError::InputValidationError(
            "Cannot compute cross-entropy on an empty batch".to_string(),
        ));
    }

    if y_true.len() != batch_size {
        return Err(ModelError::InputValidationError(format!(
            "Batch size mismatch: {} targets for {} rows of scores",
            y_true.len(),
            batch_size
        )));
    }

    y_true
        .iter()
        .map(|&label| {
            if label < 0.0 || label.fract() != 0.0 || label as usize >= n_classes {
                Err(ModelError::InputValidationError(format!(
                    "Target {} is not a class index in 0..{}",
                    label, n_classes
                )))
            } else {
                Ok(label as usize)
            }
        })
        .collect()
}

/// Row-wise softmax with max subtraction for stability
fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut out = logits.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max_val = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|x| (x - max_val).exp());
        let sum = row.sum();
        row.mapv_inplace(|x| x / sum);
    }
    out
}

impl LossFunction for CrossEntropy {
    fn compute_loss(&self, y_true: &Tensor, y_pred: &Tensor) -> Result<f32, ModelError> {
        let logits = as_2d(y_pred, "scores")?;
        let labels = as_1d(y_true, "targets")?;
        let classes = class_indices(labels, logits)?;

        let total: f32 = logits
            .axis_iter(Axis(0))
            .zip(classes.iter())
            .map(|(row, &class_idx)| {
                let max_val = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                let log_sum_exp = max_val + row.iter().map(|&x| (x - max_val).exp()).sum::<f32>().ln();
                log_sum_exp - row[class_idx]
            })
            .sum();

        Ok(total / classes.len() as f32)
    }

    fn compute_grad(&self, y_true: &Tensor, y_pred: &Tensor) -> Result<Tensor, ModelError> {
        let logits = as_2d(y_pred, "scores")?;
        let labels = as_1d(y_true, "targets")?;
        let classes = class_indices(labels, logits)?;
        let batch_size = classes.len() as f32;

        // d/dz of mean cross-entropy is (softmax(z) - one_hot(y)) / batch
        let mut grad = softmax(logits);
        for (i, &class_idx) in classes.iter().enumerate() {
            grad[[i, class_idx]] -= 1.0;
        }
        grad.mapv_inplace(|g| g / batch_size);

        Ok(grad.into_dyn())
    }
}
