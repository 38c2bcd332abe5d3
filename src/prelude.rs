pub use crate::ModelError;
pub use crate::config::*;
pub use crate::neural_network::*;
pub use crate::traits::*;
pub use crate::utility::*;
