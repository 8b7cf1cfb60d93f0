/*!
 * Error types for the srtranslate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to an inference engine
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The engine did not answer in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The requested model is not available on the engine
    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

/// Errors that can occur during subtitle parsing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// The second line of a block is not a `<start> --> <end>` range
    #[error("Malformed timing line in block {block_number}: {content:?}")]
    MalformedTiming {
        /// 1-based position of the block in the input
        block_number: usize,
        /// Raw block content
        content: String,
    },

    /// A timestamp is empty or not of the form `HH:MM:SS,mmm`
    #[error("Invalid timestamp {value:?} in block {block_number}")]
    InvalidTimestamp {
        /// 1-based position of the block in the input
        block_number: usize,
        /// Offending timestamp text
        value: String,
    },
}

/// Errors that can occur while translating a single text
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The engine is not reachable or has no usable model loaded
    #[error("Inference engine unavailable: {0}")]
    InferenceUnavailable(String),

    /// The engine did not produce a result within the per-call timeout
    #[error("Inference timed out after {0:?}")]
    InferenceTimeout(Duration),

    /// The engine stopped before producing any text
    #[error("Inference produced no output")]
    EmptyOutput,

    /// Any other provider failure
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input document could not be parsed
    #[error("Subtitle error: {0}")]
    Parse(#[from] SubtitleError),

    /// Translating one entry failed and the failure policy is to abort
    #[error("Translation of entry #{} failed ({:?}): {}", .index + 1, .original_text, .source)]
    EntryFailed {
        /// 0-based position of the entry in the document
        index: usize,
        /// Text of the entry before translation
        original_text: String,
        /// Underlying translation failure
        #[source]
        source: TranslationError,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation outside of the per-entry loop
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the translation pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Process exit code for this error
    ///
    /// `2` is left to clap for usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Subtitle(_) | Self::Pipeline(PipelineError::Parse(_)) => 3,
            Self::Translation(_) | Self::Pipeline(PipelineError::EntryFailed { .. }) => 4,
            Self::File(_) => 5,
            Self::Config(_) => 6,
            Self::Unknown(_) => 1,
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
