use crate::ModelError;
use crate::neural_network::{Tensor, as_2d};
use ndarray::{Array1, ArrayView2, Axis, concatenate};

/// A training batch of embedding pairs laid out as `k` positive pairs followed by `k`
/// negative pairs.
///
/// Row `i` of the positive half is aligned with row `k + i` of the negative half. This is the
/// layout [`PairwiseHingeLoss`](crate::neural_network::PairwiseHingeLoss) expects, and the
/// targets (`1` for the positive half, `0` for the negative half) double as class indices for
/// the classification criteria.
///
/// # Fields
///
/// - `left` - Left embeddings, shape (2k, features)
/// - `right` - Right embeddings, shape (2k, features)
/// - `targets` - `[1; k] ++ [0; k]`, shape (2k,)
///
/// # Example
/// ```rust
/// use model_factory::prelude::*;
/// use ndarray::array;
///
/// let pos = array![[1.0f32, 0.0]].into_dyn();
/// let neg_left = array![[1.0f32, 0.0]].into_dyn();
/// let neg_right = array![[0.0f32, 1.0]].into_dyn();
/// let batch = PairBatch::new(&pos, &pos, &neg_left, &neg_right).unwrap();
///
/// assert_eq!(batch.half_size(), 1);
/// assert_eq!(batch.get_targets(), &array![1.0f32, 0.0].into_dyn());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PairBatch {
    left: Tensor,
    right: Tensor,
    targets: Tensor,
    half_size: usize,
}

fn stack<'a>(first: ArrayView2<'a, f32>, second: ArrayView2<'a, f32>) -> Result<Tensor, ModelError> {
    concatenate(Axis(0), &[first, second])
        .map(|stacked| stacked.into_dyn())
        .map_err(|e| ModelError::InputValidationError(format!("Cannot stack pairs: {}", e)))
}

impl PairBatch {
    /// Builds a batch from aligned positive and negative pairs.
    ///
    /// # Parameters
    ///
    /// - `positive_left` / `positive_right` - The matching pairs, shape (k, features)
    /// - `negative_left` / `negative_right` - The non-matching pairs, shape (k, features)
    ///
    /// # Returns
    ///
    /// - `Ok(PairBatch)` - The stacked batch
    /// - `Err(ModelError::InputValidationError)` - If any input is not 2D, a half is empty, or the shapes differ
    pub fn new(
        positive_left: &Tensor,
        positive_right: &Tensor,
        negative_left: &Tensor,
        negative_right: &Tensor,
    ) -> Result<Self, ModelError> {
        let pl = as_2d(positive_left, "positive_left")?;
        let pr = as_2d(positive_right, "positive_right")?;
        let nl = as_2d(negative_left, "negative_left")?;
        let nr = as_2d(negative_right, "negative_right")?;

        let shape = pl.dim();
        if shape.0 == 0 {
            return Err(ModelError::InputValidationError(
                "A pair batch needs at least one positive and one negative pair".to_string(),
            ));
        }
        for (name, view) in [
            ("positive_right", &pr),
            ("negative_left", &nl),
            ("negative_right", &nr),
        ] {
            if view.dim() != shape {
                return Err(ModelError::InputValidationError(format!(
                    "`{}` has shape {:?}, expected {:?} to match `positive_left`",
                    name,
                    view.shape(),
                    [shape.0, shape.1]
                )));
            }
        }

        Ok(Self {
            left: stack(pl, nl)?,
            right: stack(pr, nr)?,
            targets: Self::targets_for(shape.0),
            half_size: shape.0,
        })
    }

    /// Targets for a batch with `half_size` positive then `half_size` negative pairs
    pub fn targets_for(half_size: usize) -> Tensor {
        Array1::from_iter((0..2 * half_size).map(|i| if i < half_size { 1.0 } else { 0.0 }))
            .into_dyn()
    }

    get_field_as_ref!(get_left, left, &Tensor);
    get_field_as_ref!(get_right, right, &Tensor);
    get_field_as_ref!(get_targets, targets, &Tensor);
    get_field!(half_size, half_size, usize);

    /// Number of pairs in the batch
    pub fn len(&self) -> usize {
        2 * self.half_size
    }

    /// Whether the batch holds no pairs.
    ///
    /// Always `false`, since [`PairBatch::new`] rejects empty halves. Provided to pair
    /// with [`PairBatch::len`].
    pub fn is_empty(&self) -> bool {
        self.half_size == 0
    }

    /// Splits the batch into `(left, right, targets)`
    pub fn into_parts(self) -> (Tensor, Tensor, Tensor) {
        (self.left, self.right, self.targets)
    }
}
