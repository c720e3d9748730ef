//! Solventa LLM Provider Layer
//!
//! Pluggable text-generation provider implementations.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from
//! `solventa-domain`, plus the similarity judge built on top of a
//! provider. The rest of the pipeline works against the traits and stays
//! fully functional without a configured provider.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat-completions API client
//!
//! # Examples
//!
//! ```
//! use solventa_llm::MockProvider;
//! use solventa_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("respuesta fija");
//! let result = provider.generate("cualquier prompt").unwrap();
//! assert_eq!(result, "respuesta fija");
//! ```

#![warn(missing_docs)]

pub mod judge;
pub mod openai;

use solventa_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use judge::{LlmJudge, MockJudge, NullJudge};
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No provider configured (missing API key)
    #[error("Provider not configured: {0}")]
    Unconfigured(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
///
/// # Examples
///
/// ```
/// use solventa_llm::MockProvider;
/// use solventa_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("respuesta");
/// assert_eq!(provider.generate("cualquier prompt").unwrap(), "respuesta");
///
/// // Per-prompt responses
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "respuesta1");
/// assert_eq!(provider.generate("prompt1").unwrap(), "respuesta1");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: Result<String, String>,
    responses: Arc<Mutex<HashMap<String, String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: Ok(response.into()),
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a MockProvider that fails every call with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            default_response: Err(message.into()),
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), response.into());
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(prompt) {
            return Ok(response.clone());
        }

        self.default_response
            .clone()
            .map_err(LlmError::Communication)
    }
}
