use crate::ModelError;
use crate::neural_network::Criterion;
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default value of the `--criterion` flag
pub const DEFAULT_CRITERION: &str = "classification";

/// Default seed used to initialize trainable head weights
pub const DEFAULT_SEED: u64 = 10;

/// Construction-time configuration of a pairwise model.
///
/// The criterion is stored as the raw string the user supplied. It is resolved into a
/// [`Criterion`] at each dispatch point, so an unsupported value is reported wherever the
/// model tries to use it.
///
/// # Fields
///
/// - `criterion` - Which comparison strategy to use for training (`classification`, `classification2` or `cosine`)
/// - `seed` - Seed for initializing the weights of the output head
///
/// # Example
/// ```rust
/// use clap::Parser;
/// use model_factory::config::ModelConfig;
///
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     model: ModelConfig,
/// }
///
/// let cli = Cli::parse_from(["train", "--criterion", "cosine"]);
/// assert_eq!(cli.model.criterion, "cosine");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Which criterion to use for training
    #[arg(long, default_value = DEFAULT_CRITERION)]
    #[serde(default = "default_criterion")]
    pub criterion: String,

    /// Seed for initializing output head weights
    #[arg(long, default_value_t = DEFAULT_SEED)]
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_criterion() -> String {
    DEFAULT_CRITERION.to_string()
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            criterion: default_criterion(),
            seed: DEFAULT_SEED,
        }
    }
}

impl ModelConfig {
    /// Creates a configuration with the given criterion and the default seed.
    ///
    /// The criterion is not validated here.
    pub fn new(criterion: impl Into<String>) -> Self {
        Self {
            criterion: criterion.into(),
            seed: DEFAULT_SEED,
        }
    }

    /// Sets the weight-initialization seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Parses a configuration from a JSON document. Missing fields take their defaults.
    ///
    /// # Returns
    ///
    /// - `Ok(ModelConfig)` - The parsed configuration
    /// - `Err(ModelError::InputValidationError)` - If the document is not valid JSON for this struct
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves the configured criterion string.
    ///
    /// # Returns
    ///
    /// - `Ok(Criterion)` - The matching criterion
    /// - `Err(ModelError::UnrecognizedConfig)` - If the string names no known criterion
    pub fn criterion(&self) -> Result<Criterion, ModelError> {
        self.criterion.parse()
    }
}
