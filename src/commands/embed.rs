use anyhow::Result;
use std::path::Path;

use super::{load_config, open_store, provider};
use crate::indexing::EmbeddingJob;

/// Compute embeddings for stored artifacts.
///
/// With `force`, artifacts that already have an embedding are re-embedded.
pub async fn run(root: &Path, force: bool) -> Result<()> {
    let config = load_config(root)?;
    let store = open_store(&config, root).await?;
    let embedder = provider(&config)?;

    let job = EmbeddingJob::new(store, embedder, config.embeddings.batch_size);
    let summary = job.run(force).await?;

    println!(
        "Embedded {} artifacts ({} skipped, {} total)",
        summary.embedded, summary.skipped, summary.total
    );

    Ok(())
}
