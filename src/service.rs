//! Request/response boundary around the hybrid search engine.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::SearchConfig;
use crate::search::{HybridSearchEngine, ScoredArtifact, SearchError};

/// Search request as received from a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Result cap; defaults to the configured `default_k`
    #[serde(default)]
    pub k: Option<i64>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, k: Option<i64>) -> Self {
        Self {
            query: Some(query.into()),
            k,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredArtifact>,
}

/// Validates requests, resolves `k` and delegates to the engine.
pub struct SearchService {
    engine: Arc<HybridSearchEngine>,
    default_k: usize,
    max_k: usize,
}

impl SearchService {
    pub fn new(engine: Arc<HybridSearchEngine>, config: &SearchConfig) -> Self {
        Self {
            engine,
            default_k: config.default_k.max(1),
            max_k: config.max_k.max(1),
        }
    }

    /// Effective result cap for a request: default when absent, clamped to `max_k`.
    pub fn resolve_k(&self, k: Option<i64>) -> Result<usize, SearchError> {
        match k {
            None => Ok(self.default_k.min(self.max_k)),
            Some(k) if k < 1 => Err(SearchError::Validation(format!(
                "k must be a positive integer, got {}",
                k
            ))),
            Some(k) => Ok(usize::try_from(k).unwrap_or(usize::MAX).min(self.max_k)),
        }
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let query = request
            .query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| SearchError::Validation("query must not be empty".to_string()))?;
        let k = self.resolve_k(request.k)?;

        debug!(query = %query, k = k, "Search request accepted");

        let results = self.engine.search(&query, k).await?;
        Ok(SearchResponse { results })
    }
}
