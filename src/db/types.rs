//! Query result types.
//!
//! Defines the structures used to represent query results from the store.

use serde_json::{Map, Number};
use std::fmt;
use std::time::Duration;

/// Represents the result of executing a SQL statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column metadata for the result set, in result order.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time taken to execute the statement.
    pub execution_time: Duration,

    /// Number of rows in the result.
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            row_count,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Returns the column names in result order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Converts each row into a column-name → JSON value mapping.
    ///
    /// Keys keep result-column order. When two result columns share a name the
    /// later value wins in the mapping.
    pub fn rows_as_json(&self) -> Vec<Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(column, value)| (column.name.clone(), serde_json::Value::from(value)))
                    .collect()
            })
            .collect()
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Declared column type, or "NULL" for expressions without one.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Attempts to convert the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => serde_json::Value::Number(Number::from(*i)),
            // NaN and infinities have no JSON representation
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(_) => serde_json::Value::String(value.to_display_string()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::Float(2.5).to_display_string(), "2.5");
        assert_eq!(Value::from("north").to_display_string(), "north");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_display_string(), "<3 bytes>");
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from(2.5f64), Value::Float(2.5));
        assert_eq!(Value::from("x"), Value::String("x".to_string()));
        assert_eq!(Value::from(vec![1u8]), Value::Bytes(vec![1]));
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(serde_json::Value::from(&Value::Null), json!(null));
        assert_eq!(serde_json::Value::from(&Value::Int(7)), json!(7));
        assert_eq!(serde_json::Value::from(&Value::Float(1.5)), json!(1.5));
        assert_eq!(serde_json::Value::from(&Value::Float(f64::NAN)), json!(null));
        assert_eq!(serde_json::Value::from(&Value::from("a")), json!("a"));
        assert_eq!(
            serde_json::Value::from(&Value::Bytes(vec![0; 4])),
            json!("<4 bytes>")
        );
    }

    #[test]
    fn test_rows_as_json_keeps_column_order() {
        let result = QueryResult::with_data(
            vec![
                ColumnInfo::new("region", "TEXT"),
                ColumnInfo::new("revenue", "NULL"),
            ],
            vec![
                vec![Value::from("north"), Value::Float(125.5)],
                vec![Value::from("south"), Value::Null],
            ],
        );

        let rows = result.rows_as_json();
        assert_eq!(rows.len(), 2);
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["region", "revenue"]);
        assert_eq!(rows[0]["revenue"], json!(125.5));
        assert_eq!(rows[1]["revenue"], json!(null));
        assert_eq!(result.column_names(), vec!["region", "revenue"]);
    }

    #[test]
    fn test_query_result_with_data() {
        let result = QueryResult::with_data(vec![ColumnInfo::new("n", "INTEGER")], Vec::new())
            .with_execution_time(Duration::from_millis(5));
        assert!(result.rows.is_empty());
        assert_eq!(result.row_count, 0);
        assert_eq!(result.execution_time, Duration::from_millis(5));
    }
}
