/// Stand-alone layer applying a named activation function
pub mod activation_layer;
/// Fully connected layer used by the classification heads
pub mod linear;

pub use activation_layer::*;
pub use linear::*;
