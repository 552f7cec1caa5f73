//! Ask pipeline: introspect, propose, gate and execute.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Map;
use tracing::{debug, error, info, warn};

use crate::db::{DatabaseClient, QueryResult, Schema};
use crate::error::{AgentError, Result};
use crate::proposer::StatementProposer;
use crate::safety::SafetyGate;

/// Answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    /// The statement that was executed.
    pub sql: String,
    /// Human-readable description of the result.
    pub summary: String,
    /// Result rows keyed by column name, in result-column order.
    pub rows: Vec<Map<String, serde_json::Value>>,
    /// Result column names, in order.
    pub columns: Vec<String>,
}

impl AskResponse {
    fn from_result(sql: String, summary: Option<String>, result: &QueryResult) -> Self {
        let summary = summary.unwrap_or_else(|| format!("Returned {} row(s).", result.row_count));
        Self {
            sql,
            summary,
            rows: result.rows_as_json(),
            columns: result.column_names(),
        }
    }
}

/// Answers questions against the store: introspect, propose, gate, execute.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct AskService {
    db: Arc<dyn DatabaseClient>,
    proposer: Arc<dyn StatementProposer>,
    gate: SafetyGate,
}

impl AskService {
    /// Creates a service over the given store, proposer and gate.
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        proposer: Arc<dyn StatementProposer>,
        gate: SafetyGate,
    ) -> Self {
        Self { db, proposer, gate }
    }

    /// Returns the current schema snapshot.
    pub async fn schema(&self) -> Result<Schema> {
        self.db.introspect_schema().await.inspect_err(log_store_error)
    }

    /// Answers `question`.
    ///
    /// A statement rejected by the gate is never sent to the store.
    pub async fn ask(&self, question: &str) -> Result<AskResponse> {
        let schema = self.schema().await?;
        debug!(tables = schema.tables.len(), "Schema introspected");

        let proposal = self.proposer.propose(question, &schema).await?;
        let sql = proposal.sql.trim().to_string();
        info!(sql = %sql, "Statement proposed");

        self.gate.check(&sql)?;

        let result = self.db.execute_query(&sql).await.inspect_err(|e| match e {
            AgentError::ExecutionFailed(_) => warn!(sql = %sql, "{e}"),
            other => log_store_error(other),
        })?;

        info!(
            rows = result.row_count,
            elapsed = ?result.execution_time,
            "Statement executed"
        );

        Ok(AskResponse::from_result(sql, proposal.summary, &result))
    }
}

fn log_store_error(e: &AgentError) {
    if matches!(e, AgentError::StoreUnavailable(_)) {
        error!("{e}");
    }
}
