use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{EmbeddedArtifact, KeywordIndex, RecordStore, SearchField, StoredHit, VectorTable};
use crate::artifact::{Artifact, RawArtifact};
use crate::config::Config;
use crate::metrics::{EMBEDDED_ARTIFACTS, STORED_ARTIFACTS};

/// Outcome of an ingestion batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Record counts for `stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub artifacts: usize,
    pub embedded: usize,
}

/// The artifact collection: a keyword index holding every record plus a
/// vector table holding the embedded ones.
pub struct ArtifactStore {
    vectors: VectorTable,
    keywords: RwLock<KeywordIndex>,
}

impl ArtifactStore {
    pub fn new(vectors: VectorTable, keywords: KeywordIndex) -> Self {
        Self {
            vectors,
            keywords: RwLock::new(keywords),
        }
    }

    /// Open both indexes at the locations given by `config`.
    pub async fn open(config: &Config, root: &Path) -> Result<Self> {
        let vectors = VectorTable::new(
            &config.db_path(root),
            config.storage.vector_dimension,
        )
        .await?;
        let keywords = KeywordIndex::new(&config.keyword_index_path(root))?;

        Ok(Self::new(vectors, keywords))
    }

    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    fn read_keywords(&self) -> Result<std::sync::RwLockReadGuard<'_, KeywordIndex>> {
        self.keywords
            .read()
            .map_err(|_| anyhow!("Keyword index lock poisoned"))
    }

    /// Insert records whose (title, region) pair is not already stored.
    ///
    /// New records get a fresh id. Duplicates within `records` are collapsed
    /// to the first occurrence.
    pub fn insert_if_absent(&self, records: Vec<RawArtifact>) -> Result<InsertSummary> {
        let keywords = self
            .keywords
            .write()
            .map_err(|_| anyhow!("Keyword index lock poisoned"))?;

        let mut known: HashSet<(String, String)> = keywords
            .all_artifacts()?
            .iter()
            .map(Artifact::natural_key)
            .collect();

        let mut summary = InsertSummary::default();
        let mut fresh = Vec::new();

        for raw in records {
            let artifact = raw.into_artifact(Uuid::new_v4().to_string());
            if known.insert(artifact.natural_key()) {
                fresh.push(artifact);
            } else {
                debug!(title = %artifact.title, region = %artifact.region, "Skipping existing artifact");
                summary.skipped += 1;
            }
        }

        if !fresh.is_empty() {
            keywords.add_artifacts(&fresh)?;
        }
        summary.inserted = fresh.len();

        STORED_ARTIFACTS.set(keywords.count() as f64);
        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            "Ingested artifacts"
        );

        Ok(summary)
    }

    /// Every stored artifact, embedded or not
    pub fn all_artifacts(&self) -> Result<Vec<Artifact>> {
        self.read_keywords()?.all_artifacts()
    }

    pub async fn embedded_ids(&self) -> Result<HashSet<String>> {
        self.vectors.embedded_ids().await
    }

    /// Store embeddings, replacing earlier ones for the same artifacts
    pub async fn upsert_embeddings(&self, items: Vec<EmbeddedArtifact>) -> Result<()> {
        self.vectors.upsert(items).await?;
        EMBEDDED_ARTIFACTS.set(self.vectors.count().await? as f64);
        Ok(())
    }

    /// Drop every embedding; stored records are kept
    pub async fn clear_embeddings(&self) -> Result<()> {
        self.vectors.clear().await?;
        EMBEDDED_ARTIFACTS.set(0.0);
        Ok(())
    }

    pub async fn counts(&self) -> Result<StoreCounts> {
        let artifacts = self.read_keywords()?.count();
        let embedded = self
            .vectors
            .count()
            .await
            .context("Failed to count embedded artifacts")?;

        STORED_ARTIFACTS.set(artifacts as f64);
        EMBEDDED_ARTIFACTS.set(embedded as f64);

        Ok(StoreCounts {
            artifacts,
            embedded,
        })
    }
}

#[async_trait]
impl RecordStore for ArtifactStore {
    async fn vector_search(
        &self,
        vector: &[f32],
        k: usize,
        oversample: usize,
    ) -> Result<Vec<StoredHit>> {
        let mut hits = self.vectors.search(vector, oversample.max(k)).await?;
        hits.truncate(k);
        Ok(hits)
    }

    async fn keyword_search(
        &self,
        text: &str,
        fields: &[SearchField],
        k: usize,
    ) -> Result<Vec<StoredHit>> {
        let mut hits = self.read_keywords()?.search(text, fields, k)?;
        hits.truncate(k);
        Ok(hits)
    }
}
