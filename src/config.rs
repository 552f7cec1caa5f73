//! Configuration management for the data agent.
//!
//! Handles loading configuration from TOML files and environment variables,
//! covering the HTTP server, the SQLite store, the statement proposer and the
//! LLM provider settings.

use crate::error::{AgentError, Result};
use crate::llm::LlmProvider;
use crate::proposer::ProposerKind;
use crate::safety::GatePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the store URL.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Environment variable holding a comma-separated list of allowed CORS origins.
pub const ALLOWED_ORIGINS_ENV: &str = "DATA_AGENT_ALLOWED_ORIGINS";

/// Environment variable selecting the OpenAI model.
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";

/// Store URL used when nothing else is configured: `./data.db` next to the process.
pub const DEFAULT_STORE_URL: &str = "sqlite:///./data.db";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Store connection settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Statement proposal and gating settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listening port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed to call the API from a browser.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` pair to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store URL (see [`StoreLocation::parse`] for accepted forms).
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Upper bound on a single statement's execution time.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Open the store read-only. The query service should never write.
    #[serde(default = "default_read_only")]
    pub read_only: bool,
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_read_only() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            query_timeout_secs: default_query_timeout_secs(),
            read_only: default_read_only(),
        }
    }
}

impl StoreConfig {
    /// Creates a store config for the given URL with default settings.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns a writable copy of this config (used by the loader).
    pub fn writable(&self) -> Self {
        Self {
            read_only: false,
            ..self.clone()
        }
    }

    /// Parses the URL into a store location.
    pub fn location(&self) -> Result<StoreLocation> {
        StoreLocation::parse(&self.url)
    }
}

/// Where the SQLite store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A private in-memory database.
    Memory,
    /// A database file.
    File(PathBuf),
}

impl StoreLocation {
    /// Parses a store URL.
    ///
    /// Accepted forms:
    /// - `sqlite::memory:` (also `sqlite://:memory:`)
    /// - `sqlite:///relative/path.db` and `sqlite:////absolute/path.db`
    /// - `sqlite://path.db` and `sqlite:path.db`
    ///
    /// Any query string is ignored.
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        let rest = trimmed.strip_prefix("sqlite:").ok_or_else(|| {
            AgentError::config(format!(
                "unsupported store URL '{trimmed}'. Expected a 'sqlite:' URL"
            ))
        })?;
        let rest = rest.split('?').next().unwrap_or_default();

        if rest == ":memory:" || rest == "//:memory:" {
            return Ok(Self::Memory);
        }

        let path = if let Some(path) = rest.strip_prefix("///") {
            path
        } else if let Some(path) = rest.strip_prefix("//") {
            path
        } else {
            rest
        };

        if path.is_empty() {
            return Err(AgentError::config(format!(
                "store URL '{trimmed}' does not name a database file"
            )));
        }

        Ok(Self::File(PathBuf::from(path)))
    }

    /// Returns a display string for diagnostics.
    pub fn display_string(&self) -> String {
        match self {
            Self::Memory => ":memory:".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Statement proposal and gating configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// Which statement proposer answers questions.
    #[serde(default)]
    pub proposer: ProposerKind,

    /// Which safety policy gates candidate statements.
    #[serde(default)]
    pub gate: GatePolicy,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "openai" or "mock".
    #[serde(default)]
    pub provider: LlmProvider,

    /// Model name (e.g., "gpt-4o").
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("data-agent")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AgentError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AgentError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Applies environment overrides using the given lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.store.url = url;
        }
        if let Some(origins) = lookup(ALLOWED_ORIGINS_ENV) {
            let parsed = split_origins(&origins);
            if !parsed.is_empty() {
                self.server.allowed_origins = parsed;
            }
        }
        if let Some(model) = lookup(OPENAI_MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.llm.model = model;
        }
    }
}

/// Splits a comma-separated origin list, dropping blanks.
fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
