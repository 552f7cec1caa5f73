//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::error::{AgentError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Creates an LLM client for the given provider.
///
/// `api_key` is usually read from `OPENAI_API_KEY` by the caller; the mock
/// provider ignores both the key and the model.
pub fn create_client(
    provider: LlmProvider,
    api_key: Option<String>,
    model: &str,
) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => {
            let key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AgentError::llm(format!(
                    "No API key configured. Set {OPENAI_API_KEY_ENV} or use the mock provider."
                ))
            })?;
            Ok(Box::new(OpenAiClient::new(OpenAiConfig::new(key, model))?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_client() {
        assert!(create_client(LlmProvider::Mock, None, "ignored").is_ok());
    }

    #[test]
    fn test_create_openai_without_key_fails() {
        let err = create_client(LlmProvider::OpenAi, None, "gpt-4o")
            .err()
            .unwrap();
        assert!(matches!(err, AgentError::Llm(_)));
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn test_create_openai_with_blank_key_fails() {
        assert!(create_client(LlmProvider::OpenAi, Some("  ".to_string()), "gpt-4o").is_err());
    }

    #[test]
    fn test_create_openai_with_provided_key() {
        let result = create_client(LlmProvider::OpenAi, Some("test-key".to_string()), "gpt-4o");
        assert!(result.is_ok());
    }
}
