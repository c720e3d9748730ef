//! OpenAI-compatible provider implementation
//!
//! Chat-completions client for the hosted extraction and judging model.
//!
//! # Features
//!
//! - Async HTTP communication with the chat-completions API
//! - Configurable endpoint, model, API key and sampling parameters
//! - Retry logic with exponential backoff
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use solventa_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("sk-...", "gpt-4o-mini");
//!
//! // The generate method is async; the LlmProvider trait impl wraps it
//! // for blocking call sites.
//! ```

use crate::LlmError;
use serde::{Deserialize, Serialize};
use solventa_domain::traits::LlmProvider as LlmProviderTrait;
use std::time::Duration;
use tracing::{debug, warn};

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Sampling parameters used by the extraction call sites
pub const EXTRACTION_SAMPLING: (f32, u32) = (0.1, 2000);

/// Sampling parameters used by the similarity-judging call sites
pub const JUDGING_SAMPLING: (f32, u32) = (0.3, 500);

/// OpenAI-compatible chat-completions provider.
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl OpenAiProvider {
    /// Create a provider against the default endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key, model)
    }

    /// Create a provider against a custom OpenAI-compatible endpoint.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        let (temperature, max_tokens) = EXTRACTION_SAMPLING;
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            temperature,
            max_tokens,
        }
    }

    /// Create a provider from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, LlmError> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key, DEFAULT_MODEL)),
            _ => Err(LlmError::Unconfigured(
                "OPENAI_API_KEY is not set".to_string(),
            )),
        }
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the sampling parameters used for every call
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Generate text via the chat-completions API
    ///
    /// # Errors
    ///
    /// Returns an error when the service is unreachable after retries,
    /// returns a non-success status, or the response body is malformed.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);

        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "Eres un experto en análisis de documentos. Respondes solo en JSON válido.".to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(response) => {
                    if response.status().is_success() {
                        return match response.json::<ChatResponse>().await {
                            Ok(chat) => match chat.choices.into_iter().next() {
                                Some(choice) => {
                                    debug!(
                                        chars = choice.message.content.len(),
                                        "chat completion received"
                                    );
                                    Ok(choice.message.content)
                                }
                                None => Err(LlmError::InvalidResponse(
                                    "response contains no choices".to_string(),
                                )),
                            },
                            Err(e) => Err(LlmError::InvalidResponse(format!(
                                "failed to parse response: {}",
                                e
                            ))),
                        };
                    }
                    let status = response.status();
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "unknown error".to_string());
                    last_error = Some(LlmError::Communication(format!(
                        "HTTP {}: {}",
                        status, error_text
                    )));
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, ...
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!(attempt = attempts, delay_secs = delay.as_secs(), "retrying chat completion");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("max retries exceeded".to_string())))
    }
}

impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        // Blocking wrapper for async call sites that hold no runtime
        tokio::runtime::Runtime::new()
            .map_err(|e| LlmError::Other(format!("failed to start runtime: {}", e)))?
            .block_on(async { self.generate(prompt).await })
    }
}
