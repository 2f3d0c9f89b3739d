use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use versioned_docs::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the environment snapshot is taken
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
