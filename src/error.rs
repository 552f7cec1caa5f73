//! Error types for the data agent.
//!
//! Defines the main error enum used throughout the service and the loader.

use thiserror::Error;

/// Main error type for data agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The candidate statement was denied by the safety gate and never executed.
    #[error("{0}")]
    PolicyRejected(String),

    /// The store rejected or failed an approved statement (syntax errors,
    /// missing tables, type mismatches, constraint violations, timeouts).
    #[error("SQL execution failed: {0}")]
    ExecutionFailed(String),

    /// The store could not be reached (pool closed, I/O failure, etc.)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// LLM API errors (rate limits, auth, timeouts, unusable replies, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, bad store URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV loading errors (unreadable or malformed file, bad table name).
    #[error("Load error: {0}")]
    Load(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Creates a policy rejection with the given message.
    pub fn policy_rejected(msg: impl Into<String>) -> Self {
        Self::PolicyRejected(msg.into())
    }

    /// Creates an execution failure with the given message.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Creates a store-unavailable error with the given message.
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a load error with the given message.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::PolicyRejected(_) => "Policy Rejected",
            Self::ExecutionFailed(_) => "Execution Failed",
            Self::StoreUnavailable(_) => "Store Unavailable",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Load(_) => "Load Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the error was caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::PolicyRejected(_) | Self::ExecutionFailed(_))
    }
}

/// Result type alias using AgentError.
pub type Result<T> = std::result::Result<T, AgentError>;
