/// Error types returned by every fallible operation in this crate
pub mod error;

pub use error::ModelError;

/// Traits shared by layers, loss functions and optimizers
pub mod traits;

/// A macro that generates a getter method for a `Copy` field.
///
/// # Parameters
///
/// - `$method_name` - The name of the getter method (e.g., get_n_out)
/// - `$field_name` - The name of the field to access (e.g., n_out)
/// - `$return_type` - The return type of the getter method
macro_rules! get_field {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name
        }
    };
}

/// A macro that generates a public getter method returning a reference to a field.
///
/// # Parameters
///
/// - `$method_name` - The identifier for the generated getter method name
/// - `$field_name` - The identifier of the struct field to access
/// - `$return_type` - The type expression for the return value (typically a reference type like `&Type`)
macro_rules! get_field_as_ref {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field as a reference")]
        pub fn $method_name(&self) -> $return_type {
            &self.$field_name
        }
    };
}

/// Model configuration shared with the host training framework.
///
/// `ModelConfig` carries the `--criterion` flag (and the weight-initialization seed). It derives
/// `clap::Args` so a host CLI can flatten it into its own parser, and `serde` traits so the
/// same settings can be read from a JSON file.
///
/// # Examples
/// ```rust
/// use model_factory::config::ModelConfig;
///
/// let config = ModelConfig::from_json_str(r#"{ "criterion": "cosine" }"#).unwrap();
/// assert_eq!(config.criterion, "cosine");
/// assert_eq!(config.seed, 10);
/// ```
pub mod config;

/// A convenience module that re-exports the most commonly used types and traits from this crate.
///
/// # Examples
/// ```rust
/// use model_factory::prelude::*;
///
/// let activation = get_activation_module("ReLU").unwrap();
/// assert_eq!(activation, Activation::ReLU);
/// ```
pub mod prelude;

/// Text helpers used when rendering model summaries.
///
/// # Examples
/// ```rust
/// use model_factory::utility::indent;
///
/// assert_eq!(indent("a\nb\n", 2, ' '), "  a\n  b\n");
/// ```
pub mod utility;

/// Components for building the output side of pairwise (siamese) neural models.
///
/// A pairwise model encodes a `left` and a `right` input into embeddings of width `n_out`
/// and then compares them. This module provides everything after the encoder:
///
/// # Core Components
///
/// ## Criterion dispatch
/// - **Criterion**: the closed set of comparison strategies (`classification`, `classification2`, `cosine`)
/// - **OutputHead**: one variant per criterion bundling its output transform, loss, weight constraints and backward pass
/// - **ModelBase**: the configurable base that builds a head and dispatches similarity and loss computation
/// - **PairBatch**: builder for batches laid out as positive pairs followed by negative pairs
///
/// ## Building blocks
/// - **Linear**: fully connected layer with seeded initialization and in-place weight constraints
/// - **Activation**: ReLU, Tanh and Sigmoid, selectable by name
/// - **normalize_2d / cosine_similarity**: row-wise L2 normalization and per-row cosine similarity
/// - **CrossEntropy / PairwiseHingeLoss**: the two losses used by the criteria
/// - **SGD**: plain stochastic gradient descent
///
/// # Examples
/// ```rust
/// use model_factory::prelude::*;
/// use ndarray::array;
///
/// let config = ModelConfig::new("cosine");
/// let mut model = ModelBase::new(config, 2);
/// model.build_output_op().unwrap();
///
/// let left = array![[1.0f32, 0.0], [0.0, 1.0]].into_dyn();
/// let right = array![[1.0f32, 0.0], [1.0, 0.0]].into_dyn();
/// let similarity = model.compute_similarity(&left, &right).unwrap();
/// assert!((similarity[0] - 1.0).abs() < 1e-5);
/// assert!(similarity[1].abs() < 1e-5);
/// ```
pub mod neural_network;
