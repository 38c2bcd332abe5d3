use crate::ModelError;
use crate::config::ModelConfig;
use crate::neural_network::{Criterion, Optimizer, OutputHead, Tensor};
use crate::utility::indent;
use log::{debug, info};

/// Base for pairwise models whose output side is selected by the configured criterion.
///
/// A concrete model encodes its `left` and `right` inputs into embeddings of width `n_out`
/// and delegates everything after that to `ModelBase`:
///
/// 1. [`ModelBase::build_output_op`] builds the [`OutputHead`] for the configured criterion.
/// 2. [`ModelBase::compute_similarity`] scores a batch of embedding pairs.
/// 3. [`ModelBase::compute_loss`] turns the scores into a training loss.
///
/// The criterion string is resolved at each of these three dispatch points, so an
/// unsupported value yields [`ModelError::UnrecognizedConfig`] from all of them. For a valid
/// criterion, computing similarity or loss before the head is built yields
/// [`ModelError::NotBuilt`].
///
/// # Fields
///
/// - `config` - Model configuration (criterion and seed)
/// - `n_out` - Width of the embeddings being compared
/// - `output_op` - The built output head, if any
///
/// # Example
/// ```rust
/// use model_factory::prelude::*;
/// use ndarray::array;
///
/// let mut model = ModelBase::new(ModelConfig::new("classification"), 2);
/// model.build_output_op().unwrap();
///
/// let left = array![[1.0f32, 1.0], [1.0, 0.0]].into_dyn();
/// let right = array![[1.0f32, 1.0], [0.0, 1.0]].into_dyn();
/// let scores = model.compute_similarity(&left, &right).unwrap();
/// assert_eq!(scores.shape(), &[2, 2]);
///
/// let targets = array![1.0f32, 0.0].into_dyn();
/// let loss = model.compute_loss(&scores, &targets).unwrap();
/// assert!(loss.is_finite());
///
/// let mut broken = ModelBase::new(ModelConfig::new("foo"), 2);
/// assert!(broken.build_output_op().unwrap_err().is_unrecognized_config());
/// ```
pub struct ModelBase {
    config: ModelConfig,
    n_out: usize,
    output_op: Option<OutputHead>,
}

impl ModelBase {
    /// Creates a model base. The criterion is not validated until it is used.
    ///
    /// # Parameters
    ///
    /// - `config` - Model configuration
    /// - `n_out` - Width of the embeddings the head will compare
    pub fn new(config: ModelConfig, n_out: usize) -> Self {
        Self {
            config,
            n_out,
            output_op: None,
        }
    }

    get_field_as_ref!(get_config, config, &ModelConfig);
    get_field!(get_n_out, n_out, usize);

    /// Resolves the configured criterion.
    ///
    /// # Returns
    ///
    /// - `Ok(Criterion)` - The configured criterion
    /// - `Err(ModelError::UnrecognizedConfig)` - If the configuration names no known criterion
    pub fn criterion(&self) -> Result<Criterion, ModelError> {
        self.config.criterion()
    }

    /// The built output head, if [`ModelBase::build_output_op`] has succeeded
    pub fn output_op(&self) -> Option<&OutputHead> {
        self.output_op.as_ref()
    }

    /// Builds the output head for the configured criterion, replacing any previous head.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - The head is ready
    /// - `Err(ModelError::UnrecognizedConfig)` - If the criterion is not supported
    /// - `Err(ModelError::InputValidationError)` - If `n_out` is zero
    pub fn build_output_op(&mut self) -> Result<(), ModelError> {
        let criterion = self.criterion()?;
        self.output_op = Some(OutputHead::build(criterion, self.n_out, self.config.seed)?);
        info!(
            "Output head ready: criterion={} n_out={} seed={}",
            criterion, self.n_out, self.config.seed
        );
        Ok(())
    }

    fn head(&self) -> Result<&OutputHead, ModelError> {
        self.criterion()?;
        self.output_op.as_ref().ok_or(ModelError::NotBuilt)
    }

    fn head_mut(&mut self) -> Result<&mut OutputHead, ModelError> {
        self.criterion()?;
        self.output_op.as_mut().ok_or(ModelError::NotBuilt)
    }

    /// Scores a batch of embedding pairs with the configured criterion.
    ///
    /// # Parameters
    ///
    /// - `left` - Left embeddings, shape (batch, n_out)
    /// - `right` - Right embeddings, shape (batch, n_out)
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - Scores of shape (batch, 2) for the classification criteria, similarities
    ///   of shape (batch,) for `cosine`
    /// - `Err(ModelError::UnrecognizedConfig)` - If the criterion is not supported
    /// - `Err(ModelError::NotBuilt)` - If the head has not been built
    /// - `Err(ModelError::InputValidationError)` - If the embeddings have the wrong shape
    pub fn compute_similarity(&mut self, left: &Tensor, right: &Tensor) -> Result<Tensor, ModelError> {
        self.head_mut()?.forward(left, right)
    }

    /// Computes the training loss of `output` against `target` with the configured criterion.
    ///
    /// For the classification criteria `target` holds class indices (`1` = match). For `cosine`
    /// the batch must be `k` positive pairs followed by `k` negative pairs, as built by
    /// [`PairBatch`](crate::neural_network::PairBatch).
    ///
    /// # Returns
    ///
    /// - `Ok(f32)` - The mean loss over the batch
    /// - `Err(ModelError::UnrecognizedConfig)` - If the criterion is not supported
    /// - `Err(ModelError::NotBuilt)` - If the head has not been built
    /// - `Err(ModelError::InputValidationError)` - If the targets or batch layout are invalid
    pub fn compute_loss(&self, output: &Tensor, target: &Tensor) -> Result<f32, ModelError> {
        self.head()?.compute_loss(output, target)
    }

    /// Gradient of [`ModelBase::compute_loss`] with respect to `output`
    pub fn compute_loss_grad(&self, output: &Tensor, target: &Tensor) -> Result<Tensor, ModelError> {
        self.head()?.compute_loss_grad(output, target)
    }

    /// Back-propagates through the head, returning gradients for the left and right embeddings
    /// of the last [`ModelBase::compute_similarity`] call.
    pub fn backward(&mut self, grad_output: &Tensor) -> Result<(Tensor, Tensor), ModelError> {
        self.head_mut()?.backward(grad_output)
    }

    /// Updates the head parameters with `optimizer` and re-applies the head's weight constraints
    pub fn update_parameters(&mut self, optimizer: &mut dyn Optimizer) -> Result<(), ModelError> {
        self.head_mut()?.update(optimizer)
    }

    /// Runs one training step on a batch of embedding pairs.
    ///
    /// Scores the batch, computes the loss and its gradient, back-propagates through the head
    /// and updates the head parameters.
    ///
    /// # Returns
    ///
    /// - `Ok((f32, Tensor, Tensor))` - The loss before the update and the gradients for the
    ///   left and right embeddings, to be passed on to the encoder
    /// - `Err(ModelError)` - From any of the steps above
    pub fn train_step(
        &mut self,
        left: &Tensor,
        right: &Tensor,
        target: &Tensor,
        optimizer: &mut dyn Optimizer,
    ) -> Result<(f32, Tensor, Tensor), ModelError> {
        let output = self.compute_similarity(left, right)?;
        let loss = self.compute_loss(&output, target)?;
        let grad_output = self.compute_loss_grad(&output, target)?;
        let (grad_left, grad_right) = self.backward(&grad_output)?;
        self.update_parameters(optimizer)?;
        debug!("Train step loss: {:.6}", loss);
        Ok((loss, grad_left, grad_right))
    }

    /// Number of trainable parameters in the head (zero before it is built)
    pub fn param_count(&self) -> usize {
        self.output_op.as_ref().map_or(0, |head| head.param_count())
    }

    /// Human-readable description of the model configuration and head
    pub fn summary(&self) -> String {
        let body = match &self.output_op {
            Some(head) => format!(
                "{}\nTrainable parameters: {}\n",
                head.describe(),
                head.param_count()
            ),
            None => String::from("<output head not built>\n"),
        };
        format!(
            "ModelBase (criterion: {}, n_out: {})\n{}",
            self.config.criterion,
            self.n_out,
            indent(&body, 2, ' ')
        )
    }
}
