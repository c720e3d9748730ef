//! Application configuration.
//!
//! One TOML file covers every tunable: extraction budgets, dedup
//! thresholds, image-validation radius and the LLM endpoint. Every
//! section is optional and falls back to its defaults.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use solventa_extractor::ExtractorConfig;
use solventa_llm::openai::{DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_MODEL};
use solventa_store::engine::EngineConfig;
use solventa_validator::ValidatorConfig;
use std::fs;
use std::path::Path;

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible endpoint base URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Retry attempts per call
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction budgets and timeouts
    pub extractor: ExtractorConfig,
    /// Dedup classification thresholds
    pub engine: EngineConfig,
    /// Image-validation radius
    pub validator: ValidatorConfig,
    /// LLM provider settings
    pub llm: LlmSettings,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        self.engine.validate().map_err(CliError::Config)?;
        self.validator
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        if self.llm.endpoint.trim().is_empty() {
            return Err(CliError::Config("llm.endpoint must not be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(CliError::Config("llm.model must not be empty".to_string()));
        }
        Ok(())
    }
}
