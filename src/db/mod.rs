//! Database abstraction layer.
//!
//! Provides a trait-based interface for the store so the query pipeline can
//! run against SQLite in production and an in-memory fake in tests.

mod mock;
mod schema;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use schema::{Column, Schema, Table, TableColumns};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::StoreConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Creates a client for the configured store.
///
/// Connections are opened on first use, so a store that does not exist yet
/// is reported per request rather than at startup.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn DatabaseClient>> {
    let client = SqliteClient::connect_lazy(config)?;
    Ok(Arc::new(client))
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with AgentError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the user tables of the store (internal catalog tables excluded).
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes a SQL statement and returns the full result set.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the connection.
    async fn close(&self) -> Result<()>;
}
