/// Error types that can occur while building or running a model head
///
/// # Variants
///
/// - `UnrecognizedConfig` - Indicates a configuration value (activation name, criterion) that is not supported
/// - `NotBuilt` - Indicates that the output head has not been built yet
/// - `InputValidationError` - Indicates the input data provided does not meet the expected shape or layout
/// - `ProcessingError` - Indicates that there is something wrong while processing
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    UnrecognizedConfig(String),
    NotBuilt,
    InputValidationError(String),
    ProcessingError(String),
}

impl ModelError {
    /// Returns `true` if this error was caused by an unsupported configuration value
    pub fn is_unrecognized_config(&self) -> bool {
        matches!(self, ModelError::UnrecognizedConfig(_))
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::UnrecognizedConfig(msg) => {
                write!(f, "Unrecognized configuration value: {}", msg)
            }
            ModelError::NotBuilt => {
                write!(
                    f,
                    "Output head has not been built. Call `build_output_op` before computing similarity or loss."
                )
            }
            ModelError::InputValidationError(msg) => write!(f, "Input validation error: {}", msg),
            ModelError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

/// Implements the standard error trait for ModelError
impl std::error::Error for ModelError {}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::InputValidationError(format!("Invalid model configuration: {}", err))
    }
}
