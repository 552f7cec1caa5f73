//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for SQLite stores using sqlx.

use crate::config::{StoreConfig, StoreLocation};
use crate::db::{Column, ColumnInfo, DatabaseClient, QueryResult, Row, Schema, Table, Value};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Maximum pooled connections for file-backed stores.
const MAX_CONNECTIONS: u32 = 5;

/// How long to wait for a pooled connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// How long SQLite waits on a locked database file.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// VM instructions between deadline checks while a statement runs.
const PROGRESS_INTERVAL_OPS: i32 = 1_000;

/// Extra time past the deadline before the connection is abandoned.
const INTERRUPT_GRACE: Duration = Duration::from_secs(1);

const SQLITE_INTERRUPT: i32 = 9;

/// SQLite database client.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteClient {
    /// Opens a pool for the configured store and checks that it is reachable.
    ///
    /// File stores opened read-only must already exist; writable stores are
    /// created on demand.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let location = config.location()?;
        let pool = pool_options(&location)
            .connect_with(connect_options(&location, config.read_only)?)
            .await
            .map_err(|e| {
                AgentError::store_unavailable(format!(
                    "cannot open {}: {e}",
                    location.display_string()
                ))
            })?;

        debug!(
            store = %location.display_string(),
            read_only = config.read_only,
            "Opened SQLite store"
        );

        Ok(Self::from_pool(
            pool,
            Duration::from_secs(config.query_timeout_secs),
        ))
    }

    /// Creates a pool that opens connections on first use.
    ///
    /// A missing store surfaces as `StoreUnavailable` per request instead of
    /// failing here.
    pub fn connect_lazy(config: &StoreConfig) -> Result<Self> {
        let location = config.location()?;
        let pool = pool_options(&location)
            .connect_lazy_with(connect_options(&location, config.read_only)?);

        debug!(
            store = %location.display_string(),
            read_only = config.read_only,
            "Configured SQLite store"
        );

        Ok(Self::from_pool(
            pool,
            Duration::from_secs(config.query_timeout_secs),
        ))
    }

    /// Creates a client from an existing connection pool.
    pub fn from_pool(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn pool_options(location: &StoreLocation) -> SqlitePoolOptions {
    // Every connection to `:memory:` is a separate database
    let max_connections = match location {
        StoreLocation::Memory => 1,
        StoreLocation::File(_) => MAX_CONNECTIONS,
    };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
}

/// Builds connection options for a store location.
fn connect_options(location: &StoreLocation, read_only: bool) -> Result<SqliteConnectOptions> {
    match location {
        StoreLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AgentError::config(format!("Invalid in-memory store options: {e}"))),
        StoreLocation::File(path) => Ok(SqliteConnectOptions::new()
            .filename(path)
            .read_only(read_only)
            .create_if_missing(!read_only)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))),
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let table_names = self.fetch_table_names().await?;

        let mut tables = Vec::with_capacity(table_names.len());
        for name in table_names {
            tables.push(self.fetch_table(name).await?);
        }

        Ok(Schema { tables })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let mut conn = self.pool.acquire().await.map_err(map_query_error)?;
        let result = self.fetch_bounded(&mut conn, sql).await?;

        let execution_time = start.elapsed();

        // Column names come from the result shape; an empty result has no
        // rows to read them from, so ask SQLite to describe the statement.
        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => column_info(first_row.columns()),
            None => describe_columns(&mut conn, sql).await,
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();
        let row_count = rows.len();

        debug!(row_count, ?execution_time, "Statement executed");

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteClient {
    /// Runs `sql` on `conn`, interrupting it inside SQLite once the query
    /// timeout has passed.
    ///
    /// Dropping the fetch future alone would leave the worker thread stepping
    /// the statement and the connection busy.
    async fn fetch_bounded(
        &self,
        conn: &mut PoolConnection<Sqlite>,
        sql: &str,
    ) -> Result<Vec<SqliteRow>> {
        let deadline = Instant::now() + self.query_timeout;
        conn.lock_handle()
            .await
            .map_err(map_query_error)?
            .set_progress_handler(PROGRESS_INTERVAL_OPS, move || Instant::now() < deadline);

        // The progress handler is not consulted while SQLite waits on a lock,
        // so the future is bounded too.
        let outcome = tokio::time::timeout(
            self.query_timeout + INTERRUPT_GRACE,
            sqlx::query(sql).persistent(false).fetch_all(&mut **conn),
        )
        .await;

        match outcome {
            Ok(fetched) => {
                if let Ok(mut handle) = conn.lock_handle().await {
                    handle.remove_progress_handler();
                }
                fetched.map_err(|e| {
                    if is_interrupt(&e) {
                        self.timeout_error()
                    } else {
                        map_query_error(e)
                    }
                })
            }
            Err(_) => {
                conn.close_on_drop();
                Err(self.timeout_error())
            }
        }
    }

    fn timeout_error(&self) -> AgentError {
        warn!(timeout = ?self.query_timeout, "Statement timed out");
        AgentError::execution_failed(format!(
            "Query timed out after {} seconds",
            self.query_timeout.as_secs_f64()
        ))
    }

    /// Fetches user table names, skipping SQLite's internal `sqlite_*` tables.
    async fn fetch_table_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AgentError::store_unavailable(format!("Failed to fetch tables: {e}")))
    }

    /// Fetches the columns and primary key of a table, in declared order.
    async fn fetch_table(&self, table_name: String) -> Result<Table> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?1)
            ORDER BY cid
            "#,
        )
        .bind(&table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AgentError::store_unavailable(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let mut pk_columns: Vec<(i64, String)> = rows
            .iter()
            .filter(|(_, _, _, _, pk)| *pk > 0)
            .map(|(name, _, _, _, pk)| (*pk, name.clone()))
            .collect();
        pk_columns.sort();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, not_null, default, _)| Column {
                name,
                data_type,
                is_nullable: not_null == 0,
                default,
            })
            .collect();

        Ok(Table {
            name: table_name,
            columns,
            primary_key: pk_columns.into_iter().map(|(_, name)| name).collect(),
        })
    }
}

/// Prepares the statement to read its result columns without rows.
async fn describe_columns(conn: &mut PoolConnection<Sqlite>, sql: &str) -> Vec<ColumnInfo> {
    match (&mut **conn).prepare(sql).await {
        Ok(statement) => column_info(statement.columns()),
        Err(e) => {
            debug!("Could not describe statement columns: {e}");
            Vec::new()
        }
    }
}

fn column_info(columns: &[sqlx::sqlite::SqliteColumn]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|index| convert_value(row, index))
        .collect()
}

/// Converts a single column value, decoding by the value's runtime storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match type_name.as_str() {
        "INTEGER" | "INT" | "INT8" | "BIGINT" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // TEXT and anything else: try as string
        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Maps a statement execution error to the agent taxonomy.
///
/// Errors reported by SQLite itself (syntax, missing relations, constraint or
/// read-only violations) are the caller's; connection-level failures are the
/// store's.
fn map_query_error(error: sqlx::Error) -> AgentError {
    match error {
        sqlx::Error::Database(db_error) if is_store_fault(db_error.code().as_deref()) => {
            AgentError::store_unavailable(db_error.message())
        }
        sqlx::Error::Database(db_error) => AgentError::execution_failed(db_error.message()),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_) => AgentError::store_unavailable(error.to_string()),
        other => AgentError::execution_failed(other.to_string()),
    }
}

/// True when SQLite aborted the statement from the progress handler.
fn is_interrupt(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error
            .code()
            .and_then(|c| c.parse::<i32>().ok())
            .is_some_and(|c| c & 0xff == SQLITE_INTERRUPT),
        _ => false,
    }
}

/// True for SQLite result codes that mean the store itself is unusable:
/// CORRUPT (11), CANTOPEN (14) and NOTADB (26), including extended codes.
fn is_store_fault(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| matches!(c & 0xff, 11 | 14 | 26))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Creates a file store with a `sales` table plus an AUTOINCREMENT table
    /// (which makes SQLite create its internal `sqlite_sequence` table).
    async fn seeded_store() -> (TempDir, StoreConfig) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.db");
        let config = StoreConfig::from_url(format!("sqlite:{}", path.display()));

        let writer = SqliteClient::connect(&config.writable()).await.unwrap();
        let statements = [
            "CREATE TABLE sales (region TEXT, quantity INTEGER, unit_price REAL)",
            "INSERT INTO sales VALUES ('north', 2, 10.0), ('north', 1, 5.5), ('south', 4, 2.5)",
            "CREATE TABLE customers (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL DEFAULT 'anon', blob BLOB)",
            "INSERT INTO customers (name, blob) VALUES ('ada', x'0102')",
        ];
        for statement in statements {
            sqlx::query(statement).execute(writer.pool()).await.unwrap();
        }
        writer.close().await.unwrap();

        (dir, config)
    }

    #[tokio::test]
    async fn test_introspection_excludes_internal_tables() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();

        let schema = client.introspect_schema().await.unwrap();
        let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names, vec!["customers", "sales"]);
        assert!(names.iter().all(|n| !n.starts_with("sqlite_")));
    }

    #[tokio::test]
    async fn test_introspection_columns_in_declared_order() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();

        let schema = client.introspect_schema().await.unwrap();
        let sales = schema.table("sales").unwrap();
        assert_eq!(sales.column_names(), vec!["region", "quantity", "unit_price"]);
        assert_eq!(sales.columns[1].data_type, "INTEGER");

        let customers = schema.table("customers").unwrap();
        assert_eq!(customers.primary_key, vec!["id"]);
        assert!(!customers.columns[1].is_nullable);
        assert_eq!(customers.columns[1].default.as_deref(), Some("'anon'"));
    }

    #[tokio::test]
    async fn test_execute_aggregate_query() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();

        let result = client
            .execute_query(
                "SELECT region, SUM(quantity * unit_price) AS revenue FROM sales GROUP BY region ORDER BY region;",
            )
            .await
            .unwrap();

        assert_eq!(result.column_names(), vec!["region", "revenue"]);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.rows[0][0], Value::from("north"));
        assert_eq!(result.rows[0][1], Value::Float(25.5));
        assert_eq!(result.rows[1][1], Value::Float(10.0));
    }

    #[tokio::test]
    async fn test_execute_decodes_storage_classes() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();

        let result = client
            .execute_query("SELECT id, name, blob, NULL AS nothing FROM customers")
            .await
            .unwrap();

        assert_eq!(
            result.rows[0],
            vec![
                Value::Int(1),
                Value::from("ada"),
                Value::Bytes(vec![1, 2]),
                Value::Null,
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_result_keeps_column_names() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();

        let result = client
            .execute_query("SELECT region, quantity FROM sales WHERE quantity > 100")
            .await
            .unwrap();

        assert!(result.rows.is_empty());
        assert_eq!(result.column_names(), vec!["region", "quantity"]);
    }

    #[tokio::test]
    async fn test_missing_table_is_execution_failure() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();

        let err = client
            .execute_query("SELECT * FROM nonexistent_table_xyz")
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ExecutionFailed(_)));
        assert!(err.to_string().contains("no such table: nonexistent_table_xyz"));
    }

    #[tokio::test]
    async fn test_read_only_store_refuses_writes() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();

        let err = client
            .execute_query("DELETE FROM sales")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ExecutionFailed(_)));

        let count = client
            .execute_query("SELECT COUNT(*) AS n FROM sales")
            .await
            .unwrap();
        assert_eq!(count.rows[0][0], Value::Int(3));
    }

    #[tokio::test]
    async fn test_read_only_connect_to_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let config =
            StoreConfig::from_url(format!("sqlite:{}", dir.path().join("absent.db").display()));

        let err = SqliteClient::connect(&config).await.unwrap_err();
        assert!(matches!(err, AgentError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_lazy_pool_reports_missing_file_per_request() {
        let dir = TempDir::new().unwrap();
        let config =
            StoreConfig::from_url(format!("sqlite:{}", dir.path().join("absent.db").display()));

        let client = SqliteClient::connect_lazy(&config).unwrap();

        let err = client.execute_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, AgentError::StoreUnavailable(_)));
        let err = client.introspect_schema().await.unwrap_err();
        assert!(matches!(err, AgentError::StoreUnavailable(_)));
    }

    #[test]
    fn test_store_fault_codes() {
        assert!(is_store_fault(Some("14")));
        assert!(is_store_fault(Some("526")));
        assert!(is_store_fault(Some("26")));
        assert!(!is_store_fault(Some("1")));
        assert!(!is_store_fault(Some("8")));
        assert!(!is_store_fault(None));
    }

    #[tokio::test]
    async fn test_closed_pool_is_store_unavailable() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();
        client.close().await.unwrap();

        let err = client.execute_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, AgentError::StoreUnavailable(_)));

        let err = client.introspect_schema().await.unwrap_err();
        assert!(matches!(err, AgentError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_long_statement_times_out() {
        let (_dir, config) = seeded_store().await;
        let client = SqliteClient::connect(&config).await.unwrap();
        let client = SqliteClient::from_pool(client.pool().clone(), Duration::from_millis(50));

        let err = client
            .execute_query(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 200000000) SELECT COUNT(*) FROM c",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ExecutionFailed(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_timed_out_statement_releases_connection() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let client = SqliteClient::from_pool(pool, Duration::from_millis(100));

        let started = Instant::now();
        let err = client
            .execute_query(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 300000000) SELECT COUNT(*) FROM c",
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(5));

        // The only pooled connection must be free again
        let result = tokio::time::timeout(Duration::from_secs(2), client.execute_query("SELECT 1"))
            .await
            .expect("connection still busy")
            .unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(1)]]);
    }

    #[tokio::test]
    async fn test_progress_handler_is_removed_after_success() {
        let client = SqliteClient::connect(&StoreConfig::from_url("sqlite::memory:"))
            .await
            .unwrap();
        let client = SqliteClient::from_pool(client.pool().clone(), Duration::from_millis(50));

        client.execute_query("SELECT 1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // A handler left behind would interrupt this past its deadline
        let count: i64 = sqlx::query_scalar(
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 20000) SELECT COUNT(*) FROM c",
        )
        .fetch_one(client.pool())
        .await
        .unwrap();
        assert_eq!(count, 20000);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let client = SqliteClient::connect(&StoreConfig::from_url("sqlite::memory:"))
            .await
            .unwrap();

        assert!(client.introspect_schema().await.unwrap().is_empty());
        let result = client.execute_query("SELECT 1 AS one").await.unwrap();
        assert_eq!(result.column_names(), vec!["one"]);
        assert_eq!(result.rows[0][0], Value::Int(1));
    }
}
