//! OpenAI LLM client implementation.
//!
//! Implements the LlmClient trait for OpenAI's chat completions API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AgentError, Result};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenAI API base URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Maximum number of attempts for transient errors.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gpt-4o").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Chat completions endpoint.
    pub endpoint: String,
}

impl OpenAiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            endpoint: OPENAI_API_URL.to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Points the client at a different chat completions endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new OpenAI client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Maps an unsuccessful response to (error, is_retryable).
    fn parse_error(status: StatusCode, body: &str) -> (AgentError, bool) {
        match status {
            StatusCode::UNAUTHORIZED => {
                return (
                    AgentError::llm("Authentication failed. Check your OPENAI_API_KEY."),
                    false,
                )
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return (
                    AgentError::llm("Rate limited. Please wait and try again."),
                    true,
                )
            }
            _ => {}
        }

        let is_retryable = status.is_server_error();

        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(error_response) => (
                AgentError::llm(format!(
                    "OpenAI API error: {}",
                    error_response.error.message
                )),
                is_retryable,
            ),
            Err(_) => (
                AgentError::llm(format!("OpenAI API error ({}): {}", status, body)),
                is_retryable,
            ),
        }
    }

    /// Maps a transport failure to (error, is_retryable).
    fn request_error(error: &reqwest::Error) -> (AgentError, bool) {
        if error.is_timeout() {
            (AgentError::llm("Request timed out. Try again."), true)
        } else if error.is_connect() {
            (
                AgentError::llm("Failed to connect to OpenAI API. Check your network."),
                true,
            )
        } else {
            (AgentError::llm(format!("Request failed: {}", error)), false)
        }
    }

    /// Sends one request. `Err((error, retryable))` on failure.
    async fn attempt(&self, request: &ChatRequest) -> std::result::Result<String, (AgentError, bool)> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::request_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| (AgentError::llm(format!("Failed to read response: {}", e)), false))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            (
                AgentError::llm(format!("Failed to parse response: {}", e)),
                false,
            )
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| (AgentError::llm("No response from OpenAI"), false))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
        };

        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut attempt = 1;

        loop {
            debug!(
                model = %self.config.model,
                "OpenAI API request attempt {} of {}",
                attempt, MAX_RETRY_ATTEMPTS
            );

            match self.attempt(&request).await {
                Ok(content) => return Ok(content),
                Err((error, retryable)) => {
                    if !retryable || attempt >= MAX_RETRY_ATTEMPTS {
                        return Err(error);
                    }
                    warn!(
                        "OpenAI API request failed (attempt {}), retrying in {:?}: {}",
                        attempt, delay, error
                    );
                }
            }

            tokio::time::sleep(delay).await;
            delay *= 2;
            attempt += 1;
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
