//! observatory_agent: serves the dashboard and streams host snapshots over WebSocket.

use observatory_agent::config::{self, Cli};
use observatory_agent::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = match config::from_env_and_args() {
        Ok(Cli::Run(cfg)) => cfg,
        Ok(Cli::Help(text)) => {
            println!("{text}");
            return Ok(());
        }
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    server::run(cfg).await
}
