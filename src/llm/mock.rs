//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for tests and demos without making real API calls.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every completion fails with this message.
    failure: Option<String>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Makes every completion fail as a provider error would.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("revenue") {
            return "Here is the revenue grouped by region.\n\n```sql\nSELECT region, SUM(quantity * unit_price) AS revenue FROM sales GROUP BY region;\n```".to_string();
        }

        if input_lower.contains("how many") || input_lower.contains("count") {
            return "```sql\nSELECT COUNT(*) AS count FROM sales;\n```".to_string();
        }

        if input_lower.contains("region") {
            return "```sql\nSELECT DISTINCT region FROM sales ORDER BY region;\n```".to_string();
        }

        if input_lower.contains("delete") || input_lower.contains("remove") {
            return "```sql\nDELETE FROM sales;\n```".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        if let Some(message) = &self.failure {
            return Err(AgentError::llm(message.clone()));
        }
        let input = Self::extract_user_input(messages);
        Ok(self.mock_response(&input))
    }
}
