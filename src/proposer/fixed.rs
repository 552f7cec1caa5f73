//! The fixed demo proposer.

use super::{Proposal, StatementProposer};
use crate::db::Schema;
use crate::error::Result;
use async_trait::async_trait;

/// Revenue per region over the demo `sales` relation.
pub const DEMO_SQL: &str =
    "SELECT region, SUM(quantity * unit_price) AS revenue FROM sales GROUP BY region;";

/// Summary returned with [`DEMO_SQL`].
pub const DEMO_SUMMARY: &str = "Here is the revenue grouped by region.";

/// Proposes the same statement for every question.
#[derive(Debug, Clone)]
pub struct FixedProposer {
    sql: String,
    summary: String,
}

impl FixedProposer {
    /// Creates a proposer for the demo revenue statement.
    pub fn new() -> Self {
        Self::with_statement(DEMO_SQL, DEMO_SUMMARY)
    }

    /// Creates a proposer that always returns `sql` with `summary`.
    pub fn with_statement(sql: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            summary: summary.into(),
        }
    }
}

impl Default for FixedProposer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatementProposer for FixedProposer {
    async fn propose(&self, _question: &str, _schema: &Schema) -> Result<Proposal> {
        Ok(Proposal::new(self.sql.clone()).with_summary(self.summary.clone()))
    }
}
