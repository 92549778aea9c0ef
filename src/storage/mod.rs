//! Artifact storage.
//!
//! - `vector_table` - LanceDB table holding embedded artifacts for
//!   nearest-neighbor queries
//! - `keyword_index` - Tantivy index holding every artifact for full-text
//!   queries; it is the system of record for ingestion
//! - `artifact_store` - `ArtifactStore`, combining both behind `RecordStore`

mod artifact_store;
mod keyword_index;
mod vector_table;

pub use artifact_store::{ArtifactStore, InsertSummary, StoreCounts};
pub use keyword_index::KeywordIndex;
pub use vector_table::{EmbeddedArtifact, VectorTable};

use anyhow::Result;
use async_trait::async_trait;

use crate::artifact::Artifact;

/// Text fields a keyword query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Title,
    Description,
    Region,
}

/// Fields searched by the hybrid engine's keyword query.
pub const KEYWORD_FIELDS: [SearchField; 3] =
    [SearchField::Title, SearchField::Description, SearchField::Region];

/// A record returned by one retrieval path, with that path's score.
///
/// Higher scores are better; the scale is defined by the index that
/// produced the hit and is not comparable across paths.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredHit {
    pub artifact: Artifact,
    pub score: f32,
}

impl StoredHit {
    pub fn new(artifact: Artifact, score: f32) -> Self {
        Self { artifact, score }
    }
}

/// Document collection supporting the two query modes hybrid search needs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Approximate nearest-neighbor query over stored embeddings.
    ///
    /// Fetches at least `oversample` candidates before truncating to `k`.
    /// Records without an embedding are never returned.
    async fn vector_search(
        &self,
        vector: &[f32],
        k: usize,
        oversample: usize,
    ) -> Result<Vec<StoredHit>>;

    /// Full-text query for `text` over `fields`, best matches first, at most `k`.
    async fn keyword_search(
        &self,
        text: &str,
        fields: &[SearchField],
        k: usize,
    ) -> Result<Vec<StoredHit>>;
}
