use anyhow::Result;
use clap::Parser;

use heritage_lens::cli::{Cli, Commands};
use heritage_lens::commands;
use heritage_lens::config::Config;
use heritage_lens::logging::init_logging;
use heritage_lens::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // HERITAGE_LENS_ROOT, else the current directory
    let root = Config::resolve_root();

    // Load configuration (if available, otherwise use defaults)
    let config = Config::load(&root).unwrap_or_default();

    // The guard must live until exit so buffered logs are flushed
    let _logging_guard = init_logging(&config.logging, &root)?;

    tracing::info!("Heritage Lens starting up");
    tracing::debug!("Root directory: {}", root.display());

    metrics::register_metrics();

    match cli.command {
        Commands::Init { force } => commands::init::run(&root, force).await?,
        Commands::Ingest { file } => commands::ingest::run(&root, &file).await?,
        Commands::Embed { force } => commands::embed::run(&root, force).await?,
        Commands::Search { query, k, json } => {
            commands::search::run(&root, &query, k, json).await?
        }
        Commands::Serve { host, port } => commands::serve::run(&root, host, port).await?,
        Commands::Stats { prometheus } => commands::stats::run(&root, prometheus).await?,
    }

    Ok(())
}
