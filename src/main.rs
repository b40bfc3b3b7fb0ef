//! chatrelay CLI
//!
//! Starts the relay server: reads ENDPOINT and API_KEY from the environment
//! (or a .env file), prepares the SQLite response log, and serves until
//! stopped.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use chatrelay::{run_server, Config, ResponseLog};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "Relay chat payloads to an upstream completion API, logging every reply")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Path to the SQLite response log
    #[arg(long, default_value = "responses.db")]
    db_path: PathBuf,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chatrelay=info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env()?;

    // Create the table up front so request handlers never run DDL.
    ResponseLog::init(&cli.db_path)?;
    tracing::info!(db = %cli.db_path.display(), "response log ready");

    run_server(&config, cli.db_path, &cli.host, cli.port).await
}
