/// Softmax cross-entropy over logits with integer class targets
pub mod cross_entropy;
/// Margin loss over a batch of positive pairs followed by negative pairs
pub mod pairwise_hinge;

pub use cross_entropy::*;
pub use pairwise_hinge::*;
