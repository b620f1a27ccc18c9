use anyhow::Result;
use clap::Parser;
use redgram::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment (secrets like IG_PASSWORD may live in .env).
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::info!("redgram startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("all relay workers finished"),
        Err(e) => tracing::error!(error = %e, "redgram exited with error"),
    }
    result
}
