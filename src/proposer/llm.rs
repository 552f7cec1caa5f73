//! LLM-backed statement proposer.
//!
//! Grounds the model on the current schema and pulls the SQL out of its reply.

use super::{Proposal, StatementProposer};
use crate::db::Schema;
use crate::error::{AgentError, Result};
use crate::llm::{build_messages, parse_llm_response, LlmClient};
use async_trait::async_trait;
use tracing::debug;

/// Asks an LLM to write the statement, grounded on the schema.
pub struct LlmProposer {
    client: Box<dyn LlmClient>,
}

impl LlmProposer {
    /// Creates a proposer backed by `client`.
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatementProposer for LlmProposer {
    async fn propose(&self, question: &str, schema: &Schema) -> Result<Proposal> {
        let messages = build_messages(schema, question);
        let response = self.client.complete(&messages).await?;
        debug!(response_len = response.len(), "LLM replied");

        let parsed = parse_llm_response(&response);
        let proposal = match parsed.sql {
            Some(sql) => Proposal::new(sql).with_summary(parsed.text),
            // No recognizable SQL: hand the reply to the gate as-is
            None => Proposal::new(parsed.text),
        };

        if proposal.sql.is_empty() {
            return Err(AgentError::llm("The model returned an empty reply."));
        }

        Ok(proposal)
    }
}
