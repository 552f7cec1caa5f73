//! CSV loader.
//!
//! Replaces a named table in the store with the contents of a CSV file. The
//! drop, create and inserts run in one transaction, so a failed load leaves
//! the previous table untouched.

mod csv_table;

pub use csv_table::{Cell, ColumnKind, CsvTable};

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::db::{DatabaseClient, SqliteClient};
use crate::error::{AgentError, Result};

/// A loaded column and its inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Target table.
    pub table: String,
    /// Rows inserted.
    pub rows: usize,
    /// Columns in file order.
    pub columns: Vec<LoadedColumn>,
}

/// Loads `csv_path` into `table`, replacing any existing table of that name.
///
/// The store is opened writable (and created if missing) regardless of
/// `store.read_only`.
pub async fn load_csv(csv_path: &Path, table: &str, store: &StoreConfig) -> Result<LoadSummary> {
    let table = validate_table_name(table)?;
    let parsed = read_csv_file(csv_path.to_path_buf()).await?;
    debug!(
        path = %csv_path.display(),
        rows = parsed.row_count(),
        columns = parsed.headers.len(),
        "CSV parsed"
    );

    let client = SqliteClient::connect(&store.writable()).await?;
    let result = replace_table(client.pool(), table, &parsed).await;
    client.close().await?;
    result?;

    let summary = LoadSummary {
        table: table.to_string(),
        rows: parsed.row_count(),
        columns: parsed
            .headers
            .iter()
            .zip(&parsed.kinds)
            .map(|(name, kind)| LoadedColumn {
                name: name.clone(),
                kind: *kind,
            })
            .collect(),
    };

    info!(table = %summary.table, rows = summary.rows, "Table loaded");
    Ok(summary)
}

/// Table names are used verbatim. Names with surrounding whitespace are refused.
fn validate_table_name(table: &str) -> Result<&str> {
    if table.trim().is_empty() {
        return Err(AgentError::load("table name must not be empty"));
    }
    if table.trim() != table {
        return Err(AgentError::load(format!(
            "table name '{table}' has leading or trailing whitespace"
        )));
    }
    Ok(table)
}

async fn read_csv_file(path: PathBuf) -> Result<CsvTable> {
    tokio::task::spawn_blocking(move || {
        let file = File::open(&path)
            .map_err(|e| AgentError::load(format!("cannot open {}: {e}", path.display())))?;
        CsvTable::from_reader(file)
    })
    .await
    .map_err(|e| AgentError::internal(format!("CSV reader task failed: {e}")))?
}

/// Drops, recreates and fills `table` inside one transaction.
pub async fn replace_table(pool: &SqlitePool, table: &str, data: &CsvTable) -> Result<()> {
    let quoted_table = quote_identifier(table);
    let column_defs = data
        .headers
        .iter()
        .zip(&data.kinds)
        .map(|(name, kind)| format!("{} {}", quote_identifier(name), kind.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; data.headers.len()].join(", ");

    let drop_sql = format!("DROP TABLE IF EXISTS {quoted_table}");
    let create_sql = format!("CREATE TABLE {quoted_table} ({column_defs})");
    let insert_sql = format!("INSERT INTO {quoted_table} VALUES ({placeholders})");

    // Dropping the transaction without commit rolls it back
    let mut tx = pool.begin().await.map_err(write_error)?;

    sqlx::query(&drop_sql)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;
    sqlx::query(&create_sql)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

    for record in &data.records {
        let mut insert = sqlx::query(&insert_sql);
        for cell in data.typed_row(record) {
            insert = match cell {
                Cell::Null => insert.bind(None::<String>),
                Cell::Integer(v) => insert.bind(v),
                Cell::Real(v) => insert.bind(v),
                Cell::Text(v) => insert.bind(v),
            };
        }
        insert.execute(&mut *tx).await.map_err(write_error)?;
    }

    tx.commit().await.map_err(write_error)
}

fn write_error(e: sqlx::Error) -> AgentError {
    AgentError::load(format!("failed to write table: {e}"))
}

/// Quotes an SQL identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
