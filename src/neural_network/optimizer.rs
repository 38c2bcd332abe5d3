/// Stochastic Gradient Descent
pub mod sgd;

pub use sgd::*;
