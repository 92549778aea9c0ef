use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use heritage_lens::config::Config;
use heritage_lens::embeddings::MockEmbedder;
use heritage_lens::storage::ArtifactStore;

/// Embedding dimension used by on-disk tests
pub const TEST_DIMENSION: usize = 8;

/// Initialized root directory with an open artifact store.
pub struct TestHarness {
    pub temp_dir: TempDir,
    pub store: Arc<ArtifactStore>,
    pub embedder: Arc<MockEmbedder>,
    pub config: Config,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;

        let mut config = Config::default();
        config.storage.vector_dimension = TEST_DIMENSION;
        config.save(temp_dir.path())?;

        let store = Arc::new(ArtifactStore::open(&config, temp_dir.path()).await?);

        Ok(Self {
            temp_dir,
            store,
            embedder: Arc::new(MockEmbedder::new(TEST_DIMENSION)),
            config,
        })
    }

    pub fn create_test_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let file_path = self.temp_dir.path().join(name);
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}
