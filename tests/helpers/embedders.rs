use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use heritage_lens::embeddings::{EmbeddingProvider, MockEmbedder};

/// Mock embedder that counts query embeddings.
pub struct CountingEmbedder {
    inner: MockEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: MockEmbedder::new(dimension),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.inner.embed(texts).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_query(query).await
    }

    fn embedding_dimension(&self) -> usize {
        self.inner.embedding_dimension()
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }

    fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size()
    }
}

/// Embedder whose every call fails.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("embedding service unavailable")
    }

    async fn embed_query(&self, _query: &str) -> Result<Vec<f32>> {
        bail!("embedding service unavailable")
    }

    fn embedding_dimension(&self) -> usize {
        8
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }

    fn max_batch_size(&self) -> usize {
        1
    }
}

/// Embedder that answers with an empty vector.
pub struct EmptyEmbedder;

#[async_trait]
impl EmbeddingProvider for EmptyEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![Vec::new(); texts.len()])
    }

    async fn embed_query(&self, _query: &str) -> Result<Vec<f32>> {
        Ok(Vec::new())
    }

    fn embedding_dimension(&self) -> usize {
        8
    }

    fn provider_name(&self) -> &'static str {
        "empty"
    }

    fn max_batch_size(&self) -> usize {
        1
    }
}

/// Embedder that takes `delay` before answering.
pub struct SlowEmbedder {
    pub delay: Duration,
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![vec![0.5; 8]; texts.len()])
    }

    async fn embed_query(&self, _query: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![0.5; 8])
    }

    fn embedding_dimension(&self) -> usize {
        8
    }

    fn provider_name(&self) -> &'static str {
        "slow"
    }

    fn max_batch_size(&self) -> usize {
        1
    }
}
