//! CSV parsing and column type inference.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;

use csv::ReaderBuilder;
use serde::Serialize;

use crate::error::{AgentError, Result};

/// Storage type inferred for a loaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
}

impl ColumnKind {
    /// SQLite type name used in `CREATE TABLE`.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    /// Narrowest kind that can hold `cell`. `None` for empty cells.
    fn of_cell(cell: &str) -> Option<Self> {
        if cell.is_empty() {
            return None;
        }
        let trimmed = cell.trim();
        if trimmed.parse::<i64>().is_ok() {
            Some(Self::Integer)
        } else if trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
            Some(Self::Real)
        } else {
            Some(Self::Text)
        }
    }

    fn widen(self, other: Self) -> Self {
        match (self, other) {
            (Self::Text, _) | (_, Self::Text) => Self::Text,
            (Self::Real, _) | (_, Self::Real) => Self::Real,
            _ => Self::Integer,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

/// A typed cell ready to bind into an INSERT.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// A parsed CSV file: normalized headers, inferred kinds and raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub kinds: Vec<ColumnKind>,
    pub records: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parses CSV text with a header row.
    ///
    /// Every record must have as many fields as the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(false).from_reader(reader);

        let raw_headers = reader
            .headers()
            .map_err(|e| AgentError::load(format!("failed to read CSV header: {e}")))?
            .clone();
        if raw_headers.is_empty() {
            return Err(AgentError::load("CSV file has no header row"));
        }
        let headers = normalize_headers(raw_headers.iter());

        let mut records = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AgentError::load(format!("malformed CSV record {}: {e}", index + 1))
            })?;
            records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let kinds = infer_kinds(headers.len(), &records);

        Ok(Self {
            headers,
            kinds,
            records,
        })
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// Converts a record into typed cells following the inferred kinds.
    pub fn typed_row(&self, record: &[String]) -> Vec<Cell> {
        record
            .iter()
            .zip(&self.kinds)
            .map(|(raw, kind)| typed_cell(raw, *kind))
            .collect()
    }
}

fn typed_cell(raw: &str, kind: ColumnKind) -> Cell {
    if raw.is_empty() {
        return Cell::Null;
    }
    match kind {
        ColumnKind::Integer => raw
            .trim()
            .parse()
            .map(Cell::Integer)
            .unwrap_or_else(|_| Cell::Text(raw.to_string())),
        ColumnKind::Real => raw
            .trim()
            .parse()
            .map(Cell::Real)
            .unwrap_or_else(|_| Cell::Text(raw.to_string())),
        ColumnKind::Text => Cell::Text(raw.to_string()),
    }
}

/// Infers one kind per column. Columns with no non-empty cell are TEXT.
fn infer_kinds(width: usize, records: &[Vec<String>]) -> Vec<ColumnKind> {
    (0..width)
        .map(|column| {
            records
                .iter()
                .filter_map(|record| record.get(column))
                .filter_map(|cell| ColumnKind::of_cell(cell))
                .reduce(ColumnKind::widen)
                .unwrap_or(ColumnKind::Text)
        })
        .collect()
}

/// Names blank headers `Unnamed: <index>` and suffixes repeats with `.1`,
/// `.2`, ... so every column name is unique (SQLite compares them
/// case-insensitively).
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut used = HashSet::new();
    raw.enumerate()
        .map(|(index, header)| {
            let base = match header.trim() {
                "" => format!("Unnamed: {index}"),
                name => name.to_string(),
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while !used.insert(name.to_lowercase()) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}
