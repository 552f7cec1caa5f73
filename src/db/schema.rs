//! Database schema types.
//!
//! Represents a point-in-time snapshot of the user tables in the store.

use serde::{Deserialize, Serialize};

/// Snapshot of the store's user tables, in catalog order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    /// All user tables in the store.
    pub tables: Vec<Table>,
}

/// A table name with its ordered column names, the shape handed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableColumns {
    /// Table name.
    pub table: String,
    /// Column names in declared order.
    pub columns: Vec<String>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the store has no user tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns the `{table, columns}` view of the schema.
    pub fn snapshot(&self) -> Vec<TableColumns> {
        self.tables
            .iter()
            .map(|table| TableColumns {
                table: table.name.clone(),
                columns: table.column_names(),
            })
            .collect()
    }

    /// Formats the schema for inclusion in an LLM system prompt.
    pub fn format_for_llm(&self) -> String {
        if self.tables.is_empty() {
            return "Database Schema:\n\n(no tables)\n".to_string();
        }

        let tables_text = self
            .tables
            .iter()
            .map(|table| self.format_table_for_llm(table))
            .collect::<Vec<_>>()
            .join("");

        format!("Database Schema:\n\n{}", tables_text)
    }

    fn format_table_for_llm(&self, table: &Table) -> String {
        let column_lines = table
            .columns
            .iter()
            .map(|column| {
                let annotations = [
                    table.primary_key.contains(&column.name).then_some("PK"),
                    (!column.is_nullable).then_some("NOT NULL"),
                ]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();
                Self::format_column_line(column, &annotations.join(", "))
            })
            .collect::<Vec<_>>()
            .join("");

        format!("Table: {}\n{}\n", table.name, column_lines)
    }

    fn format_column_line(column: &Column, annotation: &str) -> String {
        let data_type = if column.data_type.is_empty() {
            "ANY"
        } else {
            column.data_type.as_str()
        };
        match (annotation.is_empty(), &column.default) {
            (false, Some(default)) => format!(
                "  - {}: {} ({}, DEFAULT {})\n",
                column.name, data_type, annotation, default
            ),
            (false, None) => format!("  - {}: {} ({})\n", column.name, data_type, annotation),
            (true, Some(default)) => {
                format!("  - {}: {} (DEFAULT {})\n", column.name, data_type, default)
            }
            (true, None) => format!("  - {}: {}\n", column.name, data_type),
        }
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in declared order.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Adds a column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Returns the column names in declared order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type (e.g., "INTEGER", "TEXT"); empty when undeclared.
    pub data_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets the default value.
    pub fn with_default(self, default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..self
        }
    }
}
