use anyhow::Result;
use async_trait::async_trait;

/// Turns text into fixed-length vectors.
///
/// Implementations must be deterministic for a given model: the same text
/// always maps to the same vector, and every vector has
/// `embedding_dimension()` components.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate the embedding for a single search query
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>>;

    /// Dimension of the vectors this provider produces
    fn embedding_dimension(&self) -> usize;

    /// Provider name for logging and metrics
    fn provider_name(&self) -> &'static str;

    /// Maximum number of texts per `embed` call the provider handles well
    fn max_batch_size(&self) -> usize;
}
