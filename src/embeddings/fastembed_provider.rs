use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::config::FastEmbedConfig;
use super::provider::EmbeddingProvider;
use crate::metrics::{EMBEDDING_LATENCY, EMBEDDING_REQUESTS};

/// Local embedding provider backed by fastembed ONNX models
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    config: FastEmbedConfig,
}

impl FastEmbedProvider {
    /// Load the configured model, downloading it on first use
    pub fn new(config: &FastEmbedConfig) -> Result<Self> {
        let model_type = Self::parse_model_name(&config.model);

        info!("Loading embedding model: {}", config.model);

        let model =
            TextEmbedding::try_new(InitOptions::new(model_type).with_show_download_progress(true))
                .with_context(|| {
                    format!("Failed to initialize embedding model: {}", config.model)
                })?;

        info!("Embedding model loaded successfully");

        Ok(Self {
            model: Arc::new(model),
            config: config.clone(),
        })
    }

    fn parse_model_name(name: &str) -> EmbeddingModel {
        match name {
            "nomic-embed-text-v1.5" | "nomic-embed-text" | "nomic-ai/nomic-embed-text-v1.5" => {
                EmbeddingModel::NomicEmbedTextV15
            }
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
                EmbeddingModel::AllMiniLML6V2
            }
            "bge-small-en-v1.5" | "bge-small" | "BAAI/bge-small-en-v1.5" => {
                EmbeddingModel::BGESmallENV15
            }
            "bge-base-en-v1.5" | "bge-base" | "BAAI/bge-base-en-v1.5" => {
                EmbeddingModel::BGEBaseENV15
            }
            "bge-large-en-v1.5" | "bge-large" | "BAAI/bge-large-en-v1.5" => {
                EmbeddingModel::BGELargeENV15
            }
            _ => {
                warn!("Unknown model '{}', falling back to nomic-embed-text-v1.5", name);
                EmbeddingModel::NomicEmbedTextV15
            }
        }
    }

    fn model_dimension(model_name: &str) -> usize {
        match model_name {
            name if name.contains("bge-small") => 384,
            name if name.contains("bge-base") => 768,
            name if name.contains("bge-large") => 1024,
            name if name.contains("nomic") => 768,
            name if name.to_lowercase().contains("minilm") => 384,
            _ => 768,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();

        // fastembed is synchronous; keep it off the async workers
        let model = self.model.clone();
        let texts = texts.to_vec();
        let batch_size = self.config.batch_size;

        let all_embeddings = tokio::task::spawn_blocking(move || {
            let mut embeddings = Vec::with_capacity(texts.len());

            for chunk in texts.chunks(batch_size) {
                let batch: Vec<&str> = chunk.iter().map(|s| s.as_str()).collect();
                let batch_embeddings = model
                    .embed(batch, None)
                    .with_context(|| "Failed to generate embeddings")?;
                embeddings.extend(batch_embeddings);
            }

            Ok::<Vec<Vec<f32>>, anyhow::Error>(embeddings)
        })
        .await
        .context("FastEmbed processing task failed")??;

        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());

        Ok(all_embeddings)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed(&[query.to_string()]).await?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No embedding generated for query"))
    }

    fn embedding_dimension(&self) -> usize {
        Self::model_dimension(&self.config.model)
    }

    fn provider_name(&self) -> &'static str {
        "fastembed"
    }

    fn max_batch_size(&self) -> usize {
        self.config.batch_size
    }
}
