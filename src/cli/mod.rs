use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heritage-lens")]
#[command(author, version, about = "Hybrid semantic search over cultural artifacts")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize Heritage Lens in the current directory
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Load artifacts from a .csv or .json file
    Ingest {
        /// File to load
        file: PathBuf,
    },

    /// Compute embeddings for stored artifacts
    Embed {
        /// Re-embed artifacts that already have an embedding
        #[arg(short, long)]
        force: bool,
    },

    /// Search the artifact collection
    Search {
        /// Search query
        query: String,

        /// Maximum number of results to return
        #[arg(short, long)]
        k: Option<i64>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP search API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show store statistics and metrics
    Stats {
        /// Output in Prometheus format
        #[arg(long)]
        prometheus: bool,
    },
}
