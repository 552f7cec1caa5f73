//! Command-line argument parsing for the data agent server.

use data_agent::config::Config;
use data_agent::error::Result;
use data_agent::llm::LlmProvider;
use data_agent::proposer::ProposerKind;
use data_agent::safety::GatePolicy;
use clap::Parser;
use std::path::PathBuf;

/// Answers natural-language questions about a SQLite store over HTTP.
#[derive(Parser, Debug)]
#[command(name = "data-agent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Interface to bind
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Store URL (e.g., sqlite:///./data.db)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Origin allowed to call the API from a browser (repeatable)
    #[arg(long = "allow-origin", value_name = "ORIGIN")]
    pub allow_origins: Vec<String>,

    /// Statement proposer: fixed or llm
    #[arg(long, value_name = "KIND")]
    pub proposer: Option<ProposerKind>,

    /// Safety gate policy: keyword or strict
    #[arg(long, value_name = "POLICY")]
    pub gate: Option<GatePolicy>,

    /// LLM provider used by the llm proposer: openai or mock
    #[arg(long, value_name = "PROVIDER")]
    pub llm_provider: Option<LlmProvider>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path, using the default if not specified.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Loads the effective configuration: file, then environment, then flags.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load_from_file(&self.config_path())?;
        config.apply_env();
        self.apply_to(&mut config);
        Ok(config)
    }

    /// Overrides `config` with every flag that was given.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.store.url = url.clone();
        }
        if !self.allow_origins.is_empty() {
            config.server.allowed_origins = self.allow_origins.clone();
        }
        if let Some(proposer) = self.proposer {
            config.agent.proposer = proposer;
        }
        if let Some(gate) = self.gate {
            config.agent.gate = gate;
        }
        if let Some(provider) = self.llm_provider {
            config.llm.provider = provider;
        }
    }
}
