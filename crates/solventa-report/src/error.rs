//! Report error types

use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Error, Debug)]
pub enum ReportError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
