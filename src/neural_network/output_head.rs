use crate::ModelError;
use crate::neural_network::{
    Criterion, CrossEntropy, Layer, Linear, LossFunction, Optimizer, PairwiseHingeLoss, Tensor,
    as_2d, cosine_similarity, cosine_similarity_backward,
};
use log::{debug, trace};
use ndarray::{Array2, ArrayView2, Axis, concatenate, s};

/// Floor applied to constrained head weights so they never change sign
pub const MIN_POSITIVE_WEIGHT: f32 = 1e-6;

/// Embeddings seen by the last forward pass, kept for the backward pass
#[derive(Debug, Clone)]
pub struct PairCache {
    left: Array2<f32>,
    right: Array2<f32>,
}

/// Output head comparing a `left` and a `right` embedding, one variant per [`Criterion`].
///
/// Each variant bundles its output transform, its loss, the constraints it places on its
/// weights and its backward pass:
///
/// - `Classification` - `h = Linear(n_out → 1)(left ⊙ right)`, output `[-h, h]` of shape
///   (batch, 2). All weights are kept at or above [`MIN_POSITIVE_WEIGHT`].
/// - `TwoClass` - `Linear(n_out → 2)(left ⊙ right)`. Weights of output 0 are held at zero
///   (so class 0 scores its bias alone) and weights of output 1 at or above
///   [`MIN_POSITIVE_WEIGHT`].
/// - `Cosine` - cosine similarity of `left` and `right`, shape (batch,), trained with
///   [`PairwiseHingeLoss`]. No learned state.
///
/// Constraints are applied before every forward pass and after every parameter update.
///
/// # Example
/// ```rust
/// use model_factory::prelude::*;
/// use ndarray::Array;
///
/// let mut head = OutputHead::build(Criterion::Classification2, 3, 10).unwrap();
/// let left = Array::ones((2, 3)).into_dyn();
/// let right = Array::ones((2, 3)).into_dyn();
/// let scores = head.forward(&left, &right).unwrap();
/// assert_eq!(scores.shape(), &[2, 2]);
///
/// let weights = head.linear().unwrap().get_weights();
/// assert!(weights.column(0).iter().all(|&w| w == 0.0));
/// ```
pub enum OutputHead {
    Classification {
        linear: Linear,
        cache: Option<PairCache>,
    },
    TwoClass {
        linear: Linear,
        cache: Option<PairCache>,
    },
    Cosine {
        n_out: usize,
        loss: PairwiseHingeLoss,
        cache: Option<PairCache>,
    },
}

/// Checks that both embeddings are 2D with identical shapes
fn check_embeddings<'a>(
    left: &'a Tensor,
    right: &'a Tensor,
) -> Result<(ArrayView2<'a, f32>, ArrayView2<'a, f32>), ModelError> {
    let left = as_2d(left, "left")?;
    let right = as_2d(right, "right")?;
    if left.dim() != right.dim() {
        return Err(ModelError::InputValidationError(format!(
            "Left and right embeddings must have the same shape, got {:?} and {:?}",
            left.shape(),
            right.shape()
        )));
    }
    if left.nrows() == 0 {
        return Err(ModelError::InputValidationError(
            "Embedding batch is empty".to_string(),
        ));
    }
    Ok((left, right))
}

impl OutputHead {
    /// Builds the head for `criterion` over embeddings of width `n_out`.
    ///
    /// # Parameters
    ///
    /// - `criterion` - Which head to build
    /// - `n_out` - Width of the embeddings being compared
    /// - `seed` - Seed for initializing the linear layer of the classification heads
    ///
    /// # Returns
    ///
    /// - `Ok(OutputHead)` - The head, with its weight constraints already applied
    /// - `Err(ModelError::InputValidationError)` - If `n_out` is zero
    pub fn build(criterion: Criterion, n_out: usize, seed: u64) -> Result<Self, ModelError> {
        if n_out == 0 {
            return Err(ModelError::InputValidationError(
                "Embedding width n_out must be positive".to_string(),
            ));
        }

        let mut head = match criterion {
            Criterion::Classification => OutputHead::Classification {
                linear: Linear::new(n_out, 1, seed)?,
                cache: None,
            },
            Criterion::Classification2 => OutputHead::TwoClass {
                linear: Linear::new(n_out, 2, seed)?,
                cache: None,
            },
            Criterion::Cosine => OutputHead::Cosine {
                n_out,
                loss: PairwiseHingeLoss::new(),
                cache: None,
            },
        };
        head.apply_constraints()?;

        debug!(
            "Built {} output head over {} features ({} parameters)",
            criterion,
            n_out,
            head.param_count()
        );
        Ok(head)
    }

    /// The criterion this head implements
    pub fn criterion(&self) -> Criterion {
        match self {
            OutputHead::Classification { .. } => Criterion::Classification,
            OutputHead::TwoClass { .. } => Criterion::Classification2,
            OutputHead::Cosine { .. } => Criterion::Cosine,
        }
    }

    /// Width of the embeddings this head compares
    pub fn n_out(&self) -> usize {
        match self {
            OutputHead::Classification { linear, .. } | OutputHead::TwoClass { linear, .. } => {
                linear.get_input_dim()
            }
            OutputHead::Cosine { n_out, .. } => *n_out,
        }
    }

    /// The linear layer of a classification head, `None` for the cosine head
    pub fn linear(&self) -> Option<&Linear> {
        match self {
            OutputHead::Classification { linear, .. } | OutputHead::TwoClass { linear, .. } => {
                Some(linear)
            }
            OutputHead::Cosine { .. } => None,
        }
    }

    /// Mutable access to the linear layer.
    ///
    /// Constraints are not re-applied automatically after edits made through this reference;
    /// call [`OutputHead::apply_constraints`] or rely on the next forward pass.
    pub fn linear_mut(&mut self) -> Option<&mut Linear> {
        match self {
            OutputHead::Classification { linear, .. } | OutputHead::TwoClass { linear, .. } => {
                Some(linear)
            }
            OutputHead::Cosine { .. } => None,
        }
    }

    /// Enforces the head's weight constraints in place.
    ///
    /// No-op for the cosine head.
    pub fn apply_constraints(&mut self) -> Result<(), ModelError> {
        match self {
            OutputHead::Classification { linear, .. } => {
                linear.clamp_weights_min(MIN_POSITIVE_WEIGHT);
            }
            OutputHead::TwoClass { linear, .. } => {
                linear.zero_unit_weights(0)?;
                linear.clamp_unit_weights_min(1, MIN_POSITIVE_WEIGHT)?;
            }
            OutputHead::Cosine { .. } => {}
        }
        Ok(())
    }

    /// Scores a batch of embedding pairs.
    ///
    /// # Parameters
    ///
    /// - `left` - Left embeddings, shape (batch, n_out)
    /// - `right` - Right embeddings, shape (batch, n_out)
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - Two-class scores of shape (batch, 2) for the classification heads,
    ///   similarities of shape (batch,) for the cosine head
    /// - `Err(ModelError::InputValidationError)` - If the embeddings are not 2D, differ in shape
    ///   or do not match the head's input width
    pub fn forward(&mut self, left: &Tensor, right: &Tensor) -> Result<Tensor, ModelError> {
        self.apply_constraints()?;

        let (left_2d, right_2d) = check_embeddings(left, right)?;
        if left_2d.ncols() != self.n_out() {
            return Err(ModelError::InputValidationError(format!(
                "{} head expects embeddings of width {}, got {}",
                self.criterion(),
                self.n_out(),
                left_2d.ncols()
            )));
        }
        trace!(
            "{} head forward on batch of {}",
            self.criterion(),
            left_2d.nrows()
        );
        let new_cache = Some(PairCache {
            left: left_2d.to_owned(),
            right: right_2d.to_owned(),
        });

        match self {
            OutputHead::Classification { linear, cache } => {
                let product = &left_2d * &right_2d;
                let hidden = linear.forward_2d(product.view())?;
                let negated = hidden.mapv(|h| -h);
                let scores = concatenate(Axis(1), &[negated.view(), hidden.view()]).map_err(
                    |e| ModelError::ProcessingError(format!("Failed to build scores: {}", e)),
                )?;
                *cache = new_cache;
                Ok(scores.into_dyn())
            }
            OutputHead::TwoClass { linear, cache } => {
                let product = &left_2d * &right_2d;
                let scores = linear.forward_2d(product.view())?;
                *cache = new_cache;
                Ok(scores.into_dyn())
            }
            OutputHead::Cosine { cache, .. } => {
                let similarity = cosine_similarity(left, right)?;
                *cache = new_cache;
                Ok(similarity)
            }
        }
    }

    /// Computes the training loss of `output` against `target`.
    ///
    /// Classification heads use [`CrossEntropy`] with class-index targets; the cosine head uses
    /// [`PairwiseHingeLoss`], which requires the positive-then-negative batch layout.
    pub fn compute_loss(&self, output: &Tensor, target: &Tensor) -> Result<f32, ModelError> {
        match self {
            OutputHead::Classification { .. } | OutputHead::TwoClass { .. } => {
                CrossEntropy::new().compute_loss(target, output)
            }
            OutputHead::Cosine { loss, .. } => loss.compute_loss(target, output),
        }
    }

    /// Gradient of [`OutputHead::compute_loss`] with respect to `output`
    pub fn compute_loss_grad(&self, output: &Tensor, target: &Tensor) -> Result<Tensor, ModelError> {
        match self {
            OutputHead::Classification { .. } | OutputHead::TwoClass { .. } => {
                CrossEntropy::new().compute_grad(target, output)
            }
            OutputHead::Cosine { loss, .. } => loss.compute_grad(target, output),
        }
    }

    /// Back-propagates `grad_output` through the head.
    ///
    /// Stores the linear layer's parameter gradients (classification heads) and returns the
    /// gradients with respect to the left and right embeddings of the last forward pass.
    ///
    /// # Returns
    ///
    /// - `Ok((Tensor, Tensor))` - Gradients for `left` and `right`, shape (batch, n_out)
    /// - `Err(ModelError::ProcessingError)` - If no forward pass preceded this call or the
    ///   gradient has the wrong shape
    pub fn backward(&mut self, grad_output: &Tensor) -> Result<(Tensor, Tensor), ModelError> {
        let batch_size = match self.cache() {
            Some(pair) => pair.left.nrows(),
            None => Err(ModelError::ProcessingError(String::from(
                "Forward pass has not been run",
            )))?,
        };
        // validated before the cache is consumed
        self.check_grad_shape(grad_output, batch_size)?;

        let PairCache { left, right } = match self.cache_mut().take() {
            Some(pair) => pair,
            None => Err(ModelError::ProcessingError(String::from(
                "Forward pass has not been run",
            )))?,
        };

        let grad_product = match self {
            OutputHead::Classification { linear, .. } => {
                let grad = as_2d(grad_output, "grad_output")?;
                // output = [-h, h], so dL/dh = g[:, 1] - g[:, 0]
                let grad_hidden = &grad.slice(s![.., 1..2]) - &grad.slice(s![.., 0..1]);
                linear.backward_2d(grad_hidden.view())?
            }
            OutputHead::TwoClass { linear, .. } => {
                let grad = as_2d(grad_output, "grad_output")?;
                linear.backward_2d(grad)?
            }
            OutputHead::Cosine { .. } => {
                return cosine_similarity_backward(
                    &left.into_dyn(),
                    &right.into_dyn(),
                    grad_output,
                );
            }
        };

        let grad_left = &grad_product * &right;
        let grad_right = &grad_product * &left;
        Ok((grad_left.into_dyn(), grad_right.into_dyn()))
    }

    fn cache(&self) -> Option<&PairCache> {
        match self {
            OutputHead::Classification { cache, .. }
            | OutputHead::TwoClass { cache, .. }
            | OutputHead::Cosine { cache, .. } => cache.as_ref(),
        }
    }

    fn cache_mut(&mut self) -> &mut Option<PairCache> {
        match self {
            OutputHead::Classification { cache, .. }
            | OutputHead::TwoClass { cache, .. }
            | OutputHead::Cosine { cache, .. } => cache,
        }
    }

    /// Two-class heads expect (batch, 2), the cosine head (batch,) or (batch, 1)
    fn check_grad_shape(&self, grad_output: &Tensor, batch_size: usize) -> Result<(), ModelError> {
        let shape = grad_output.shape();
        let valid = match self {
            OutputHead::Classification { .. } | OutputHead::TwoClass { .. } => {
                shape == &[batch_size, 2][..]
            }
            OutputHead::Cosine { .. } => {
                shape == &[batch_size][..] || shape == &[batch_size, 1][..]
            }
        };
        if !valid {
            return Err(ModelError::ProcessingError(format!(
                "Gradient output shape {:?} doesn't match the last forward pass over {} pairs",
                shape, batch_size
            )));
        }
        Ok(())
    }

    /// Applies `optimizer` to the head's linear layer and re-applies the weight constraints.
    ///
    /// No-op for the cosine head.
    pub fn update(&mut self, optimizer: &mut dyn Optimizer) -> Result<(), ModelError> {
        if let Some(linear) = self.linear_mut() {
            optimizer.update(linear);
            self.apply_constraints()?;
            debug!("Updated {} head and re-applied weight constraints", self.criterion());
        }
        Ok(())
    }

    /// Number of trainable parameters
    pub fn param_count(&self) -> usize {
        self.linear().map_or(0, |linear| linear.param_count())
    }

    /// One-line description used by model summaries
    pub fn describe(&self) -> String {
        match self {
            OutputHead::Classification { linear, .. } => format!(
                "Classification: Linear({} -> 1), scores [-h, h], cross-entropy",
                linear.get_input_dim()
            ),
            OutputHead::TwoClass { linear, .. } => format!(
                "Classification2: Linear({} -> 2), class 0 pinned to bias, cross-entropy",
                linear.get_input_dim()
            ),
            OutputHead::Cosine { loss, .. } => format!(
                "Cosine: cosine similarity, pairwise hinge (margin {})",
                loss.get_margin()
            ),
        }
    }
}
