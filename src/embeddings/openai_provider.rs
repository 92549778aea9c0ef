use anyhow::{anyhow, Context, Result};
use async_openai::{
    config::OpenAIConfig as AsyncOpenAIConfig, types::CreateEmbeddingRequestArgs, Client,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::config::OpenAIConfig;
use super::provider::EmbeddingProvider;
use crate::metrics::{EMBEDDING_LATENCY, EMBEDDING_REQUESTS};

/// OpenAI limit on inputs per embeddings request
const MAX_INPUTS_PER_REQUEST: usize = 2048;

/// Hosted embedding provider speaking the OpenAI embeddings API
pub struct OpenAIProvider {
    client: Client<AsyncOpenAIConfig>,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: &OpenAIConfig) -> Result<Self> {
        let api_key = config
            .load_api_key()
            .context("Failed to load OpenAI API key")?;

        let mut openai_config = AsyncOpenAIConfig::new().with_api_key(api_key);

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        let client = Client::with_config(openai_config);

        info!("Initialized OpenAI provider with model: {}", config.model);

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn model_dimension(model_name: &str) -> usize {
        match model_name {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        }
    }

    /// Retry with exponential backoff
    async fn retry_with_backoff<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff = self.config.initial_backoff_ms;

        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt >= self.config.max_retries => {
                    return Err(e).context("Max retries exceeded");
                }
                Err(e) => {
                    warn!("Embedding request failed (attempt {}): {}", attempt + 1, e);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    backoff = (backoff as f64 * self.config.exponential_base) as u64;
                    backoff = backoff.min(self.config.max_backoff_ms);
                    attempt += 1;
                }
            }
        }
    }

    async fn request_batch(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.config.model).input(inputs);
        if let Some(dimensions) = self.config.dimensions {
            args.dimensions(dimensions);
        }
        let request = args.build().context("Failed to build embeddings request")?;

        let response = self
            .retry_with_backoff(|| async {
                self.client
                    .embeddings()
                    .create(request.clone())
                    .await
                    .context("Embeddings API request failed")
            })
            .await?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.max_batch_size()) {
            let embeddings = self.request_batch(batch.to_vec()).await?;
            if embeddings.len() != batch.len() {
                return Err(anyhow!(
                    "Embeddings API returned {} vectors for {} inputs",
                    embeddings.len(),
                    batch.len()
                ));
            }
            all_embeddings.extend(embeddings);
            debug!("Embedded batch of {} texts", batch.len());
        }

        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());

        Ok(all_embeddings)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();

        let embedding = self
            .request_batch(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding returned"))?;

        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());

        Ok(embedding)
    }

    fn embedding_dimension(&self) -> usize {
        self.config
            .dimensions
            .map(|d| d as usize)
            .unwrap_or_else(|| Self::model_dimension(&self.config.model))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn max_batch_size(&self) -> usize {
        self.config.batch_size.min(MAX_INPUTS_PER_REQUEST)
    }
}
