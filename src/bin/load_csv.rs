//! load-csv - loads a CSV file into a table of the data agent's store.

use clap::Parser;
use data_agent::config::{StoreConfig, StoreLocation, DEFAULT_STORE_URL};
use data_agent::error::Result;
use data_agent::loader::{load_csv, LoadSummary};
use data_agent::logging;
use std::path::PathBuf;
use tracing::error;

/// Replaces TABLE_NAME in the store with the contents of CSV_FILE.
#[derive(Parser, Debug)]
#[command(name = "load-csv")]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV file with a header row
    #[arg(value_name = "CSV_FILE")]
    csv_file: PathBuf,

    /// Table to create or replace (used verbatim)
    #[arg(value_name = "TABLE_NAME")]
    table_name: String,

    /// Store URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_STORE_URL, value_name = "URL")]
    database_url: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_stderr_logging();
    let args = Args::parse();

    if let Err(e) = run(&args).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let store = StoreConfig::from_url(args.database_url.clone());

    println!("Current working directory: {}", current_dir_display());
    println!("DATABASE_URL: {}", store.url);
    println!("Resolved database path: {}", resolved_path(&store.location()?));

    let summary = load_csv(&args.csv_file, &args.table_name, &store).await?;
    print_summary(&summary);
    Ok(())
}

fn current_dir_display() -> String {
    std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|e| format!("<unavailable: {e}>"))
}

/// Absolute form of the store path, as the loader will open it.
fn resolved_path(location: &StoreLocation) -> String {
    match location {
        StoreLocation::Memory => location.display_string(),
        StoreLocation::File(path) if path.is_absolute() => path.display().to_string(),
        StoreLocation::File(path) => std::env::current_dir()
            .map(|dir| dir.join(path).display().to_string())
            .unwrap_or_else(|_| path.display().to_string()),
    }
}

fn print_summary(summary: &LoadSummary) {
    println!(
        "Loaded {} row(s) into table '{}'",
        summary.rows, summary.table
    );
    for column in &summary.columns {
        println!("  {} {}", column.name, column.kind);
    }
}
