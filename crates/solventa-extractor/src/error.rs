//! Error types for extraction

use thiserror::Error;

/// Errors that can occur while turning a source document into proposal
/// candidates.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Malformed or unreadable parsed-document handle
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unrecognized file extension, rejected before parsing
    #[error("Unsupported file kind: {0}")]
    UnsupportedKind(String),

    /// Document rendering exceeds the configured maximum
    #[error("Document too large: {0} chars (max: {1})")]
    DocumentTooLarge(usize, usize),

    /// LLM provider error during fallback extraction
    #[error("LLM error: {0}")]
    Llm(String),

    /// Fallback call exceeded its deadline
    #[error("Fallback extraction timeout")]
    Timeout,

    /// Unparseable LLM response
    #[error("Invalid fallback response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidResponse(e.to_string())
    }
}
