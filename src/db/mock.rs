//! Mock database clients for testing.
//!
//! Provide in-memory store implementations for headless testing of the query
//! pipeline and the HTTP surface.

use super::{ColumnInfo, DatabaseClient, QueryResult, Schema, Value};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns predefined results and records every
/// statement it is asked to execute.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    schema: Schema,
    result: Option<QueryResult>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Sets the result returned for every executed statement.
    pub fn with_result(mut self, result: QueryResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Returns the statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        if let Some(result) = &self.result {
            return Ok(result.clone());
        }

        // Without a canned result, echo the statement back as a single row
        let columns = vec![ColumnInfo::new("result", "TEXT")];
        let rows = vec![vec![Value::String(format!("Mock result for: {}", sql))]];

        Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose store is unreachable.
#[derive(Debug, Default)]
pub struct FailingDatabaseClient;

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Err(AgentError::store_unavailable("unable to open database file"))
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(AgentError::store_unavailable("unable to open database file"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
