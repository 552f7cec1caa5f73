//! SQL safety gate.
//!
//! Decides whether a candidate statement may run. The default keyword policy
//! is a last-resort textual firewall; the strict policy additionally parses
//! the SQL and only lets read-only statements through. Neither replaces
//! opening the store read-only.

mod denylist;
mod parser;

pub use denylist::{find_destructive_keyword, is_destructive, DESTRUCTIVE_KEYWORDS};
pub use parser::{classify_sql, SqlClassifier};

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Message returned when the keyword denylist rejects a statement.
pub const DESTRUCTIVE_SQL_MESSAGE: &str = "Destructive SQL is not allowed.";

/// Safety level classification for SQL queries, ordered from least to most
/// dangerous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafetyLevel {
    /// Read-only statements (SELECT, EXPLAIN).
    Safe,
    /// Data modification (INSERT, UPDATE).
    Mutating,
    /// Data loss or schema changes (DELETE, DROP, ALTER, CREATE, PRAGMA, ...).
    Destructive,
}

impl SafetyLevel {
    /// Returns true if the statement may run against a read-only store.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Safe)
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Alter,
    Create,
    Explain,
    Pragma,
    Attach,
    /// Multiple statements detected; contains the most dangerous type.
    Multiple(Box<StatementType>),
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Pragma => write!(f, "PRAGMA"),
            Self::Attach => write!(f, "ATTACH"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// The determined safety level.
    pub level: SafetyLevel,
    /// The type of statement(s) detected.
    pub statement_type: StatementType,
    /// Why the statement could not be classified normally, if applicable.
    pub reason: Option<String>,
}

impl ClassificationResult {
    /// Creates a new classification result.
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
            reason: None,
        }
    }

    /// Creates a classification result carrying a reason.
    pub fn with_reason(
        level: SafetyLevel,
        statement_type: StatementType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            level,
            statement_type,
            reason: Some(reason.into()),
        }
    }

    /// Returns true if the statement is read-only.
    pub fn is_read_only(&self) -> bool {
        self.level.is_read_only()
    }
}

/// Which policy the gate enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatePolicy {
    /// Keyword denylist only.
    #[default]
    Keyword,
    /// Keyword denylist plus parser-based read-only classification.
    Strict,
}

impl GatePolicy {
    /// Returns the policy as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for GatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "Unknown gate policy: {s}. Expected: keyword or strict"
            )),
        }
    }
}

impl fmt::Display for GatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decides whether candidate statements are permitted to execute.
#[derive(Debug, Default)]
pub struct SafetyGate {
    policy: GatePolicy,
    classifier: SqlClassifier,
}

impl SafetyGate {
    /// Creates a gate enforcing the given policy.
    pub fn new(policy: GatePolicy) -> Self {
        Self {
            policy,
            classifier: SqlClassifier::new(),
        }
    }

    /// Returns the enforced policy.
    pub fn policy(&self) -> GatePolicy {
        self.policy
    }

    /// Returns true if `sql` may execute.
    pub fn allows(&self, sql: &str) -> bool {
        self.check(sql).is_ok()
    }

    /// Checks `sql` against the policy, returning `PolicyRejected` on denial.
    pub fn check(&self, sql: &str) -> Result<()> {
        if let Some(keyword) = find_destructive_keyword(sql) {
            warn!(keyword, "Statement rejected by keyword denylist");
            return Err(AgentError::policy_rejected(DESTRUCTIVE_SQL_MESSAGE));
        }

        if self.policy == GatePolicy::Strict {
            let classification = self.classifier.classify(sql);
            if !classification.is_read_only() {
                warn!(
                    level = %classification.level,
                    statement = %classification.statement_type,
                    "Statement rejected by strict classification"
                );
                let message = match classification.reason {
                    Some(reason) => format!("Only read-only SQL is allowed. {reason}"),
                    None => format!(
                        "Only read-only SQL is allowed (detected {}).",
                        classification.statement_type
                    ),
                };
                return Err(AgentError::policy_rejected(message));
            }
        }

        Ok(())
    }
}
