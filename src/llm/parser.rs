//! Response parsing for LLM outputs.
//!
//! Extracts SQL from LLM responses that may contain markdown code blocks or
//! bare statements mixed with prose.

use regex::Regex;

/// Fenced block tagged as SQL, on one line or several.
const SQL_FENCE_PATTERN: &str = r"(?is)```sql\b\s*(.*?)```";

/// Fenced block with no language tag.
const PLAIN_FENCE_PATTERN: &str = r"(?s)```[ \t]*\r?\n(.*?)```";

/// A bare SELECT up to the first semicolon, backtick or the end of the text.
const BARE_SELECT_PATTERN: &str = r"(?is)\bselect\b[^;`]*;?";

/// Result of parsing an LLM response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Any explanatory text around the SQL.
    pub text: String,
    /// Extracted SQL query, if found.
    pub sql: Option<String>,
}

impl ParsedResponse {
    /// Creates a new parsed response with only text (no SQL).
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sql: None,
        }
    }

    /// Creates a new parsed response with SQL and optional text.
    pub fn with_sql(text: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sql: Some(sql.into()),
        }
    }
}

/// Parses an LLM response to extract SQL.
///
/// Looks, in order, for:
/// - a ```sql fenced block
/// - a fenced block without a language tag
/// - a bare `SELECT ...` statement
///
/// The first match wins. Text outside the match is returned as prose.
pub fn parse_llm_response(response: &str) -> ParsedResponse {
    if let Some(parsed) = extract(response, SQL_FENCE_PATTERN, 1) {
        return parsed;
    }
    if let Some(parsed) = extract(response, PLAIN_FENCE_PATTERN, 1) {
        return parsed;
    }
    if let Some(parsed) = extract(response, BARE_SELECT_PATTERN, 0) {
        return parsed;
    }

    ParsedResponse::text_only(response.trim())
}

/// Extracts capture `group` of the first match of `pattern`, keeping the text
/// on either side of the whole match as prose.
fn extract(response: &str, pattern: &str, group: usize) -> Option<ParsedResponse> {
    let regex = Regex::new(pattern).ok()?;
    let captures = regex.captures(response)?;
    let whole = captures.get(0)?;
    let sql = captures.get(group)?.as_str().trim();

    if sql.is_empty() {
        return None;
    }

    let before = response[..whole.start()].trim();
    let after = response[whole.end()..].trim();
    let text = match (before.is_empty(), after.is_empty()) {
        (false, false) => format!("{before}\n{after}"),
        (false, true) => before.to_string(),
        (true, _) => after.to_string(),
    };

    Some(ParsedResponse::with_sql(text, sql))
}
