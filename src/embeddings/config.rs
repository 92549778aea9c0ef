use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingsConfig;

/// FastEmbed provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastEmbedConfig {
    pub model: String,
    pub batch_size: usize,
}

impl From<&EmbeddingsConfig> for FastEmbedConfig {
    fn from(config: &EmbeddingsConfig) -> Self {
        Self {
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
        }
    }
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key (can be an environment variable reference like ${OPENAI_API_KEY})
    pub api_key: String,
    pub model: String,
    /// For Azure or other compatible endpoints
    pub base_url: Option<String>,
    pub dimensions: Option<u32>,
    pub max_retries: usize,
    pub batch_size: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub exponential_base: f64,
}

impl From<&EmbeddingsConfig> for OpenAIConfig {
    fn from(config: &EmbeddingsConfig) -> Self {
        Self {
            api_key: config.openai_api_key.clone().unwrap_or_default(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.clone(),
            dimensions: config.openai_dimensions,
            max_retries: config.max_retries,
            batch_size: config.batch_size.max(1),
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            exponential_base: 2.0,
        }
    }
}

impl OpenAIConfig {
    /// Load API key from configuration or environment variable
    pub fn load_api_key(&self) -> anyhow::Result<String> {
        // 1. Explicit configuration
        if !self.api_key.is_empty() && !self.api_key.starts_with("${") {
            return Ok(self.api_key.clone());
        }

        // 2. Environment variable reference
        if self.api_key.starts_with("${") && self.api_key.ends_with('}') {
            let var_name = &self.api_key[2..self.api_key.len() - 1];
            return std::env::var(var_name)
                .with_context(|| format!("Environment variable {} not set", var_name));
        }

        // 3. Standard environment variable
        std::env::var("OPENAI_API_KEY")
            .context("No API key configured and OPENAI_API_KEY environment variable not set")
    }
}
