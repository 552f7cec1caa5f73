//! Prompt construction for LLM requests.
//!
//! Builds system prompts with the store schema as grounding context.

use crate::db::Schema;
use crate::llm::types::Message;

/// System prompt template for the SQL assistant.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a data analyst answering questions about a SQLite database by writing a single SQL query.

{schema}
INSTRUCTIONS:
- Generate exactly one read-only SQLite SELECT statement
- Only use the tables and columns listed above
- Give computed columns short snake_case aliases
- Never modify data: no INSERT, UPDATE, DELETE, DROP, ALTER, REPLACE or TRUNCATE

OUTPUT FORMAT:
Return the SQL query wrapped in a ```sql code block.
Put a one-sentence description of the result before the code block."#;

/// Builds the system prompt with the schema injected.
pub fn build_system_prompt(schema: &Schema) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{schema}", &schema.format_for_llm())
}

/// Builds the message list for answering one question.
pub fn build_messages(schema: &Schema, question: &str) -> Vec<Message> {
    vec![
        Message::system(build_system_prompt(schema)),
        Message::user(question.trim()),
    ]
}
