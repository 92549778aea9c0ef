use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use crate::Config;

pub async fn run(root: &Path, force: bool) -> Result<()> {
    let data_dir = Config::data_dir(root);

    if Config::is_initialized(root) && !force {
        bail!(
            "Heritage Lens is already initialized in {:?} (use --force to rewrite the configuration)",
            data_dir
        );
    }

    let config = Config::default();
    config.save(root)?;

    info!("Initialized Heritage Lens in {:?}", data_dir);
    println!(
        "✓ Created {} with default configuration",
        data_dir.display()
    );
    println!("\nNext steps:");
    println!("  1. Edit .heritage-lens/config.toml to choose an embedding provider");
    println!("  2. Run 'heritage-lens ingest <file.csv|file.json>' to load artifacts");
    println!("  3. Run 'heritage-lens embed' to compute embeddings");
    println!("  4. Run 'heritage-lens serve' to start the search API");

    Ok(())
}
