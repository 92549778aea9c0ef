//! Hybrid search combining vector similarity and keyword matching.
//!
//! Both retrieval paths run against the same collection. Their hits are merged
//! by artifact id, scored with [`combined_score`], stably sorted and capped.

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::error::{RetrievalPath, SearchError};
use super::scoring::{combined_score, extract_keywords};
use crate::artifact::Artifact;
use crate::config::{PartialFailurePolicy, SearchConfig};
use crate::embeddings::EmbeddingProvider;
use crate::metrics::{SEARCH_FAILURES, SEARCH_LATENCY, SEARCH_REQUESTS, SEARCH_RESULTS};
use crate::storage::{RecordStore, StoredHit, KEYWORD_FIELDS};

/// A search result: the artifact plus the scores it was ranked by.
///
/// `vector_score` and `text_score` are 0 when the corresponding path did not
/// return the artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredArtifact {
    #[serde(flatten)]
    pub artifact: Artifact,
    pub vector_score: f32,
    pub text_score: f32,
    /// Combined ranking score
    pub score: f32,
}

impl ScoredArtifact {
    fn from_vector_hit(hit: StoredHit) -> Self {
        Self {
            artifact: hit.artifact,
            vector_score: hit.score,
            text_score: 0.0,
            score: 0.0,
        }
    }

    fn from_keyword_hit(hit: StoredHit) -> Self {
        Self {
            artifact: hit.artifact,
            vector_score: 0.0,
            text_score: hit.score,
            score: 0.0,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone)]
pub struct HybridSearchConfig {
    /// Candidates requested from the vector index before truncating to `k`
    pub oversample: usize,
    /// Bonus per distinct query keyword found in the title
    pub title_bonus: f32,
    /// Per-call limit for the embedding and each retrieval; `None` waits forever
    pub timeout: Option<Duration>,
    pub partial_failure: PartialFailurePolicy,
}

impl Default for HybridSearchConfig {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for HybridSearchConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            oversample: config.oversample,
            title_bonus: config.title_bonus,
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
            partial_failure: config.partial_failure,
        }
    }
}

/// Merge hits from both paths by artifact id.
///
/// Vector hits are inserted first. A keyword hit for an id already present
/// only sets that entry's `text_score`; the vector hit's fields are kept.
/// Otherwise the keyword hit is appended with `vector_score` 0. A repeated
/// vector hit replaces the earlier one in place.
pub fn merge_hits(vector_hits: Vec<StoredHit>, keyword_hits: Vec<StoredHit>) -> Vec<ScoredArtifact> {
    let mut merged: Vec<ScoredArtifact> = Vec::with_capacity(vector_hits.len() + keyword_hits.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for hit in vector_hits {
        match positions.get(&hit.artifact.id) {
            Some(&pos) => merged[pos] = ScoredArtifact::from_vector_hit(hit),
            None => {
                positions.insert(hit.artifact.id.clone(), merged.len());
                merged.push(ScoredArtifact::from_vector_hit(hit));
            }
        }
    }

    for hit in keyword_hits {
        match positions.get(&hit.artifact.id) {
            Some(&pos) => merged[pos].text_score = hit.score,
            None => {
                positions.insert(hit.artifact.id.clone(), merged.len());
                merged.push(ScoredArtifact::from_keyword_hit(hit));
            }
        }
    }

    merged
}

/// Score merged entries, sort by score descending and keep the first `k`.
///
/// The sort is stable, so equal scores keep merge order.
pub fn rank(mut merged: Vec<ScoredArtifact>, query: &str, title_bonus: f32, k: usize) -> Vec<ScoredArtifact> {
    let keywords = extract_keywords(query);

    for entry in merged.iter_mut() {
        entry.score = combined_score(
            entry.vector_score,
            entry.text_score,
            &keywords,
            &entry.artifact.title,
            title_bonus,
        );
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(k);
    merged
}

/// Hybrid search over a [`RecordStore`].
///
/// Holds no per-request state; one engine serves concurrent requests.
pub struct HybridSearchEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn RecordStore>,
    config: HybridSearchConfig,
}

impl HybridSearchEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn RecordStore>,
        config: HybridSearchConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Return at most `k` artifacts for `query`, best first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredArtifact>, SearchError> {
        let start = Instant::now();
        SEARCH_REQUESTS.inc();

        let outcome = self.run(query, k).await;

        let elapsed = start.elapsed();
        SEARCH_LATENCY.observe(elapsed.as_secs_f64());

        match &outcome {
            Ok(results) => {
                SEARCH_RESULTS.observe(results.len() as f64);
                info!(
                    query = query,
                    k = k,
                    results = results.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Hybrid search completed"
                );
            }
            Err(e) => {
                SEARCH_FAILURES.inc();
                warn!(
                    query = query,
                    k = k,
                    kind = e.kind(),
                    error = %e,
                    "Hybrid search failed"
                );
            }
        }

        outcome
    }

    async fn run(&self, query: &str, k: usize) -> Result<Vec<ScoredArtifact>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::Validation("query must not be empty".to_string()));
        }
        if k == 0 {
            return Err(SearchError::Validation("k must be at least 1".to_string()));
        }

        let embedding = self.embed_query(query).await?;

        let (vector_hits, keyword_hits) = tokio::join!(
            self.with_timeout(self.store.vector_search(&embedding, k, self.config.oversample)),
            self.with_timeout(self.store.keyword_search(query, &KEYWORD_FIELDS, k)),
        );

        let vector_hits = vector_hits.map_err(|m| SearchError::retrieval(RetrievalPath::Vector, m));
        let keyword_hits = keyword_hits.map_err(|m| SearchError::retrieval(RetrievalPath::Keyword, m));
        let (vector_hits, keyword_hits) = self.resolve_paths(vector_hits, keyword_hits)?;

        debug!(
            vector_hits = vector_hits.len(),
            keyword_hits = keyword_hits.len(),
            "Retrieved candidates"
        );

        let merged = merge_hits(vector_hits, keyword_hits);
        Ok(rank(merged, query, self.config.title_bonus, k))
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, SearchError> {
        let embedding = self
            .with_timeout(self.embedder.embed_query(query))
            .await
            .map_err(SearchError::Embedding)?;

        if embedding.is_empty() {
            return Err(SearchError::Embedding(format!(
                "{} returned an empty vector",
                self.embedder.provider_name()
            )));
        }

        Ok(embedding)
    }

    /// Apply the partial-failure policy to the two retrieval outcomes.
    fn resolve_paths(
        &self,
        vector_hits: Result<Vec<StoredHit>, SearchError>,
        keyword_hits: Result<Vec<StoredHit>, SearchError>,
    ) -> Result<(Vec<StoredHit>, Vec<StoredHit>), SearchError> {
        match (self.config.partial_failure, vector_hits, keyword_hits) {
            (_, Ok(v), Ok(t)) => Ok((v, t)),
            (PartialFailurePolicy::Degrade, Ok(v), Err(e)) => {
                warn!(error = %e, "Keyword retrieval failed, using vector results only");
                Ok((v, Vec::new()))
            }
            (PartialFailurePolicy::Degrade, Err(e), Ok(t)) => {
                warn!(error = %e, "Vector retrieval failed, using keyword results only");
                Ok((Vec::new(), t))
            }
            (_, Err(e), _) | (_, _, Err(e)) => Err(e),
        }
    }

    /// Await `fut` under the configured timeout, flattening errors to messages.
    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, String>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let result = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| format!("timed out after {:?}", limit))?,
            None => fut.await,
        };

        result.map_err(|e| format!("{:#}", e))
    }
}
