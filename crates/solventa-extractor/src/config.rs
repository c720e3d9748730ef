//! Configuration for the extractor

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for structural and fallback extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Excerpt budget (characters) for a word-processor document sent to
    /// the fallback model
    pub docx_excerpt_chars: usize,

    /// Excerpt budget (characters) per worksheet sent to the fallback model
    pub xlsx_excerpt_chars: usize,

    /// Maximum time for a single fallback call (seconds)
    pub fallback_timeout_secs: u64,

    /// Hard ceiling on a document's full markup rendering (characters);
    /// larger documents skip the fallback entirely
    pub max_document_chars: usize,
}

impl ExtractorConfig {
    /// Get the fallback timeout as a Duration
    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.docx_excerpt_chars == 0 {
            return Err(ExtractorError::Config(
                "docx_excerpt_chars must be greater than 0".to_string(),
            ));
        }
        if self.xlsx_excerpt_chars == 0 {
            return Err(ExtractorError::Config(
                "xlsx_excerpt_chars must be greater than 0".to_string(),
            ));
        }
        if self.fallback_timeout_secs == 0 {
            return Err(ExtractorError::Config(
                "fallback_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_document_chars < self.docx_excerpt_chars {
            return Err(ExtractorError::Config(
                "max_document_chars cannot be below docx_excerpt_chars".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str).map_err(|e| ExtractorError::Config(e.to_string()))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self).map_err(|e| ExtractorError::Config(e.to_string()))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            docx_excerpt_chars: 12_000,
            xlsx_excerpt_chars: 8_000,
            fallback_timeout_secs: 60,
            max_document_chars: 1_000_000,
        }
    }
}
