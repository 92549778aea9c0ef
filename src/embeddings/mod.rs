mod config;
mod fastembed_provider;
pub mod mock;
mod openai_provider;
mod provider;

pub use config::{FastEmbedConfig, OpenAIConfig};
pub use fastembed_provider::FastEmbedProvider;
pub use mock::MockEmbedder;
pub use openai_provider::OpenAIProvider;
pub use provider::EmbeddingProvider;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{EmbeddingBackend, EmbeddingsConfig};

/// Construct the configured embedding provider.
pub fn create_provider(config: &EmbeddingsConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::FastEmbed => {
            Arc::new(FastEmbedProvider::new(&FastEmbedConfig::from(config))?)
        }
        EmbeddingBackend::OpenAI => Arc::new(OpenAIProvider::new(&OpenAIConfig::from(config))?),
    };

    info!(
        provider = provider.provider_name(),
        dimension = provider.embedding_dimension(),
        "Embedding provider ready"
    );

    Ok(provider)
}
