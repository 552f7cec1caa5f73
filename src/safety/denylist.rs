//! Keyword denylist check.
//!
//! Matching is substring-based over the lowercased text, not tokenized. A
//! column such as `updated_at` therefore trips the `update` keyword; that
//! false positive is accepted.

/// Operation keywords that signal data or schema modification.
pub const DESTRUCTIVE_KEYWORDS: [&str; 7] = [
    "drop", "delete", "alter", "update", "truncate", "insert", "replace",
];

/// Returns the first denylisted keyword found in `sql`, if any.
pub fn find_destructive_keyword(sql: &str) -> Option<&'static str> {
    let lowered = sql.to_lowercase();
    DESTRUCTIVE_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lowered.contains(keyword))
}

/// Returns true if `sql` contains any denylisted keyword, in any letter case.
pub fn is_destructive(sql: &str) -> bool {
    find_destructive_keyword(sql).is_some()
}
