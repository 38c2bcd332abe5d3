use crate::ModelError;
use crate::neural_network::{LossFunction, Tensor, as_1d};
use ndarray::{Array1, ArrayView1};

/// Margin by which a positive pair must outscore its aligned negative pair
pub const DEFAULT_HINGE_MARGIN: f32 = 0.25;

/// Hinge loss over similarity scores of a batch laid out as `k` positive pairs followed by
/// `k` negative pairs.
///
/// Position `i` of the first half is aligned with position `k + i` of the second half, and
/// the loss is `mean(max(0, s[k + i] + margin - s[i]))`. The layout is checked on every call:
/// the batch must be non-empty and even, `target[0]` must be `1` and `target[k]` must be `0`.
/// [`PairBatch`](crate::neural_network::PairBatch) produces batches that satisfy this.
///
/// # Example
///
/// ```rust
/// use model_factory::prelude::*;
/// use ndarray::array;
///
/// let hinge = PairwiseHingeLoss::new();
/// let similarity = array![0.9f32, 0.1].into_dyn();
/// let targets = array![1.0f32, 0.0].into_dyn();
/// assert_eq!(hinge.compute_loss(&targets, &similarity).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseHingeLoss {
    margin: f32,
}

impl Default for PairwiseHingeLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl PairwiseHingeLoss {
    /// Creates the loss with [`DEFAULT_HINGE_MARGIN`]
    pub fn new() -> Self {
        Self {
            margin: DEFAULT_HINGE_MARGIN,
        }
    }

    /// Creates the loss with a custom margin.
    ///
    /// # Returns
    ///
    /// - `Ok(PairwiseHingeLoss)` - The loss
    /// - `Err(ModelError::InputValidationError)` - If the margin is negative or not finite
    pub fn with_margin(margin: f32) -> Result<Self, ModelError> {
        if !(margin >= 0.0 && margin.is_finite()) {
            return Err(ModelError::InputValidationError(format!(
                "Hinge margin must be non-negative and finite, got {}",
                margin
            )));
        }
        Ok(Self { margin })
    }

    get_field!(get_margin, margin, f32);

    /// Checks the positive-then-negative layout and returns the scores with the half size `k`
    fn split<'a>(
        &self,
        y_true: &'a Tensor,
        y_pred: &'a Tensor,
    ) -> Result<(ArrayView1<'a, f32>, usize), ModelError> {
        let scores = as_1d(y_pred, "similarity")?;
        let targets = as_1d(y_true, "targets")?;

        if scores.len() != targets.len() {
            return Err(ModelError::InputValidationError(format!(
                "Batch size mismatch: {} similarities for {} targets",
                scores.len(),
                targets.len()
            )));
        }

        let n = scores.len();
        if n == 0 || n % 2 != 0 {
            return Err(ModelError::InputValidationError(format!(
                "Pairwise hinge loss needs a non-empty batch of k positive then k negative pairs, got {} rows",
                n
            )));
        }

        let k = n / 2;
        if targets[0] != 1.0 {
            return Err(ModelError::InputValidationError(format!(
                "First pair of the batch must be positive (target 1), got {}",
                targets[0]
            )));
        }
        if targets[k] != 0.0 {
            return Err(ModelError::InputValidationError(format!(
                "Pair at the midpoint ({}) must be negative (target 0), got {}",
                k, targets[k]
            )));
        }

        Ok((scores, k))
    }
}

impl LossFunction for PairwiseHingeLoss {
    fn compute_loss(&self, y_true: &Tensor, y_pred: &Tensor) -> Result<f32, ModelError> {
        let (scores, k) = self.split(y_true, y_pred)?;

        let total: f32 = (0..k)
            .map(|i| (scores[k + i] + self.margin - scores[i]).max(0.0))
            .sum();

        Ok(total / k as f32)
    }

    fn compute_grad(&self, y_true: &Tensor, y_pred: &Tensor) -> Result<Tensor, ModelError> {
        let (scores, k) = self.split(y_true, y_pred)?;
        let scale = 1.0 / k as f32;

        let mut grad = Array1::<f32>::zeros(scores.len());
        for i in 0..k {
            if scores[k + i] + self.margin - scores[i] > 0.0 {
                grad[i] -= scale;
                grad[k + i] += scale;
            }
        }

        grad.into_shape_with_order(y_pred.raw_dim())
            .map_err(|e| ModelError::ProcessingError(format!("Failed to shape gradient: {}", e)))
    }
}
