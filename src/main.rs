use clap::Parser;
use tracing_subscriber::EnvFilter;

use stowage::cli;
use stowage::error::Result;
use stowage::storage::StorageClient;

use stowage::cli::Args;
use stowage::config::load_gateway_config;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging();

    if let Err(e) = run_app(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_app(args: Args) -> Result<()> {
    let config = load_gateway_config()?;
    let client = StorageClient::connect(&config)?;
    cli::run(args, client).await?;
    Ok(())
}

// Logs go to stderr so JSON output on stdout stays parseable.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
