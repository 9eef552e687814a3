//! Error types for pattern detection.

use thiserror::Error;

/// Fatal errors surfaced by the detection pipeline.
///
/// Recoverable conditions (empty periods, degenerate embeddings, an empty
/// result) are not errors; they are recorded as
/// [`PipelineWarning`](crate::core::diagnostics::PipelineWarning)s.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The input table does not have the shape the normalizer requires.
    #[error("Input schema error: {message}")]
    InputSchema { message: String },

    /// A configuration value is out of range.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A pattern string handed to the query helper could not be resolved.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A JSON configuration document could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl PatternError {
    pub fn input_schema(message: impl Into<String>) -> Self {
        Self::InputSchema {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for pattern detection operations.
pub type Result<T> = std::result::Result<T, PatternError>;
