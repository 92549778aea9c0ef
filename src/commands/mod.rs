//! CLI command implementations.

pub mod embed;
pub mod ingest;
pub mod init;
pub mod search;
pub mod serve;
pub mod stats;

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::search::{HybridSearchConfig, HybridSearchEngine};
use crate::service::SearchService;
use crate::storage::ArtifactStore;

/// Load the configuration, failing if `init` has not been run under `root`.
fn load_config(root: &Path) -> Result<Config> {
    if !Config::is_initialized(root) {
        bail!(
            "Heritage Lens is not initialized in {}.\n\
             Run 'heritage-lens init' first.",
            root.display()
        );
    }

    Config::load(root)
}

async fn open_store(config: &Config, root: &Path) -> Result<Arc<ArtifactStore>> {
    Ok(Arc::new(ArtifactStore::open(config, root).await?))
}

/// Wire provider, store and engine into a search service.
fn build_service(
    config: &Config,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<ArtifactStore>,
) -> SearchService {
    let engine = HybridSearchEngine::new(
        embedder,
        store,
        HybridSearchConfig::from(&config.search),
    );
    SearchService::new(Arc::new(engine), &config.search)
}

fn provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    create_provider(&config.embeddings)
}
