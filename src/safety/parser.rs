//! Structure-aware statement classification.
//!
//! Statements are parsed with the SQLite dialect and walked down to every
//! place SQLite lets a write hide inside a read: CTE bodies, derived tables,
//! joins and both arms of compound selects.

use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use super::{ClassificationResult, SafetyLevel, StatementType};

/// A safety level with the statement kind responsible for it.
type Verdict = (SafetyLevel, StatementType);

/// Parses SQL and classifies it by safety level.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: SQLiteDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Classifies `sql`. Empty or unparseable input is destructive.
    pub fn classify(&self, sql: &str) -> ClassificationResult {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(e) => {
                return ClassificationResult::with_reason(
                    SafetyLevel::Destructive,
                    StatementType::Unknown,
                    format!("Could not parse SQL ({e})."),
                )
            }
        };

        match statements.as_slice() {
            [] => ClassificationResult::with_reason(
                SafetyLevel::Destructive,
                StatementType::Unknown,
                "Empty SQL statement.",
            ),
            [single] => {
                let (level, kind) = statement_verdict(single);
                ClassificationResult::new(level, kind)
            }
            batch => {
                let (level, kind) = batch.iter().map(statement_verdict).fold(read_verdict(), worse);
                ClassificationResult::new(level, StatementType::Multiple(Box::new(kind)))
            }
        }
    }
}

/// Classifies SQL with a throwaway classifier.
pub fn classify_sql(sql: &str) -> ClassificationResult {
    SqlClassifier::new().classify(sql)
}

fn read_verdict() -> Verdict {
    (SafetyLevel::Safe, StatementType::Select)
}

/// The more dangerous of two verdicts; on a tie the first one stands.
fn worse(first: Verdict, second: Verdict) -> Verdict {
    if second.0 > first.0 {
        second
    } else {
        first
    }
}

fn statement_verdict(statement: &Statement) -> Verdict {
    use SafetyLevel::{Destructive, Mutating, Safe};

    match statement {
        Statement::Query(query) => query_verdict(query),
        // Plain EXPLAIN only describes the plan
        Statement::Explain {
            analyze: false, ..
        } => (Safe, StatementType::Explain),
        Statement::Explain { statement, .. } => (statement_verdict(statement).0, StatementType::Explain),

        Statement::Insert(_) => (Mutating, StatementType::Insert),
        Statement::Update { .. } => (Mutating, StatementType::Update),

        Statement::Delete(_) => (Destructive, StatementType::Delete),
        Statement::Drop { .. } => (Destructive, StatementType::Drop),
        Statement::AlterTable { .. } => (Destructive, StatementType::Alter),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateVirtualTable { .. } => (Destructive, StatementType::Create),
        Statement::Pragma { .. } => (Destructive, StatementType::Pragma),
        Statement::AttachDatabase { .. } => (Destructive, StatementType::Attach),

        // Transactions, VACUUM, triggers and the rest
        _ => (Destructive, StatementType::Unknown),
    }
}

fn query_verdict(query: &Query) -> Verdict {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| &with.cte_tables)
        .map(|cte| query_verdict(&cte.query));

    ctes.chain(std::iter::once(body_verdict(&query.body)))
        .fold(read_verdict(), worse)
}

fn body_verdict(body: &SetExpr) -> Verdict {
    match body {
        SetExpr::Select(select) => select
            .from
            .iter()
            .flat_map(relations)
            .map(relation_verdict)
            .fold(read_verdict(), worse),
        SetExpr::Query(query) => query_verdict(query),
        SetExpr::SetOperation { left, right, .. } => worse(body_verdict(left), body_verdict(right)),
        SetExpr::Insert(statement) | SetExpr::Update(statement) => statement_verdict(statement),
        SetExpr::Values(_) | SetExpr::Table(_) => read_verdict(),

        #[allow(unreachable_patterns)]
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// The base relation of a FROM item followed by everything joined to it.
fn relations(item: &TableWithJoins) -> impl Iterator<Item = &TableFactor> {
    std::iter::once(&item.relation).chain(item.joins.iter().map(|join| &join.relation))
}

fn relation_verdict(factor: &TableFactor) -> Verdict {
    match factor {
        TableFactor::Derived { subquery, .. } => query_verdict(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => relations(table_with_joins)
            .map(relation_verdict)
            .fold(read_verdict(), worse),
        _ => read_verdict(),
    }
}
