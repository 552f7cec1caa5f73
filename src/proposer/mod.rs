//! Statement proposers.
//!
//! A proposer turns a natural-language question plus the current schema into
//! a candidate SQL statement. Candidates are untrusted until the safety gate
//! approves them.

mod fixed;
mod llm;

pub use fixed::{FixedProposer, DEMO_SQL, DEMO_SUMMARY};
pub use llm::LlmProposer;

use crate::config::LlmConfig;
use crate::db::Schema;
use crate::error::Result;
use crate::llm::create_client;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A candidate statement and an optional human-readable summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// SQL text, not yet validated.
    pub sql: String,
    /// One-line description of what the statement returns.
    pub summary: Option<String>,
}

impl Proposal {
    /// Creates a proposal without a summary.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            summary: None,
        }
    }

    /// Attaches a summary. Blank summaries are dropped.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.summary = (!summary.trim().is_empty()).then(|| summary.trim().to_string());
        self
    }
}

/// Source of candidate statements.
#[async_trait]
pub trait StatementProposer: Send + Sync {
    /// Proposes a statement answering `question` against `schema`.
    async fn propose(&self, question: &str, schema: &Schema) -> Result<Proposal>;
}

/// Which proposer answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposerKind {
    /// The fixed demo statement.
    #[default]
    Fixed,
    /// A statement generated by the configured LLM provider.
    Llm,
}

impl ProposerKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Llm => "llm",
        }
    }
}

impl FromStr for ProposerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "llm" => Ok(Self::Llm),
            _ => Err(format!("Unknown proposer: {s}. Expected: fixed or llm")),
        }
    }
}

impl fmt::Display for ProposerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builds the proposer selected by `kind`.
///
/// `api_key` is only consulted for the LLM proposer.
pub fn build(
    kind: ProposerKind,
    llm: &LlmConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn StatementProposer>> {
    match kind {
        ProposerKind::Fixed => Ok(Arc::new(FixedProposer::new())),
        ProposerKind::Llm => {
            let client = create_client(llm.provider, api_key, &llm.model)?;
            Ok(Arc::new(LlmProposer::new(client)))
        }
    }
}
