use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::artifact::Artifact;
use crate::embeddings::EmbeddingProvider;
use crate::storage::{ArtifactStore, EmbeddedArtifact};

/// Outcome of an embedding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedSummary {
    /// Artifacts in the store
    pub total: usize,
    /// Artifacts embedded by this run
    pub embedded: usize,
    /// Artifacts left alone because they already had an embedding
    pub skipped: usize,
}

/// Computes embeddings for stored artifacts and writes them to the vector table.
///
/// A failed batch aborts the run; batches written before it are kept.
pub struct EmbeddingJob {
    store: Arc<ArtifactStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    show_progress: bool,
}

impl EmbeddingJob {
    pub fn new(store: Arc<ArtifactStore>, embedder: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        let batch_size = batch_size.clamp(1, embedder.max_batch_size().max(1));
        Self {
            store,
            embedder,
            batch_size,
            show_progress: true,
        }
    }

    /// Disable the terminal progress bar
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Embed artifacts that have no embedding yet.
    ///
    /// With `force` the vector table is rebuilt from scratch, which is also how
    /// a change of embedding dimension is applied.
    pub async fn run(&self, force: bool) -> Result<EmbedSummary> {
        let start = Instant::now();

        if self.embedder.embedding_dimension() != self.store.dimension() {
            bail!(
                "Provider {} produces {}-dimensional vectors but the store expects {}; \
                 update storage.vector_dimension and re-run with --force",
                self.embedder.provider_name(),
                self.embedder.embedding_dimension(),
                self.store.dimension()
            );
        }

        let artifacts = self.store.all_artifacts()?;
        let total = artifacts.len();

        let pending: Vec<Artifact> = if force {
            warn!("Dropping existing embeddings before re-embedding");
            self.store.clear_embeddings().await?;
            artifacts
        } else {
            let embedded = self.store.embedded_ids().await?;
            artifacts
                .into_iter()
                .filter(|a| !embedded.contains(&a.id))
                .collect()
        };

        let mut summary = EmbedSummary {
            total,
            embedded: 0,
            skipped: total - pending.len(),
        };

        if pending.is_empty() {
            info!(total = total, "All artifacts already embedded");
            return Ok(summary);
        }

        info!(
            pending = pending.len(),
            batch_size = self.batch_size,
            provider = self.embedder.provider_name(),
            "Embedding artifacts"
        );

        let progress = self.progress_bar(pending.len());

        for batch in pending.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(Artifact::embedding_text).collect();

            let vectors = self
                .embedder
                .embed(&texts)
                .await
                .with_context(|| format!("Failed to embed batch of {} artifacts", batch.len()))?;

            if vectors.len() != batch.len() {
                bail!(
                    "Provider returned {} embeddings for {} artifacts",
                    vectors.len(),
                    batch.len()
                );
            }

            let items = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(artifact, vector)| EmbeddedArtifact { artifact, vector })
                .collect();

            self.store.upsert_embeddings(items).await?;

            summary.embedded += batch.len();
            progress.inc(batch.len() as u64);
            debug!(embedded = summary.embedded, "Stored embedding batch");
        }

        progress.finish_with_message("Complete");

        info!(
            embedded = summary.embedded,
            skipped = summary.skipped,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Embedding run finished"
        );

        Ok(summary)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] Artifacts: [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
