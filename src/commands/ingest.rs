use anyhow::Result;
use std::path::Path;

use super::{load_config, open_store};
use crate::ingest::ingest_file;

/// Load artifacts from `file` into the store.
pub async fn run(root: &Path, file: &Path) -> Result<()> {
    let config = load_config(root)?;
    let store = open_store(&config, root).await?;

    let summary = ingest_file(&store, file)?;

    println!(
        "Ingested {}: {} new, {} already present",
        file.display(),
        summary.inserted,
        summary.skipped
    );
    if summary.inserted > 0 {
        println!("Run 'heritage-lens embed' to make new artifacts visible to vector search.");
    }

    Ok(())
}
