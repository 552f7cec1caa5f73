//! data-agent - answers natural-language questions about a SQLite store.

mod cli;

use cli::Cli;
use data_agent::error::Result;
use data_agent::llm::OPENAI_API_KEY_ENV;
use data_agent::query::AskService;
use data_agent::safety::SafetyGate;
use data_agent::{db, logging, proposer, server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = cli.resolve_config()?;

    let location = config.store.location()?;
    info!(
        store = %location.display_string(),
        proposer = %config.agent.proposer,
        gate = %config.agent.gate,
        "Starting data agent"
    );

    let store = db::connect(&config.store)?;
    let proposer = proposer::build(
        config.agent.proposer,
        &config.llm,
        std::env::var(OPENAI_API_KEY_ENV).ok(),
    )?;
    let service = AskService::new(store.clone(), proposer, SafetyGate::new(config.agent.gate));

    server::serve(&config.server, service).await?;
    store.close().await
}
