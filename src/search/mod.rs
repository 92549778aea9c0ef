//! Hybrid artifact search.
//!
//! - `hybrid` - `HybridSearchEngine`: embed, retrieve from both paths, merge, rank
//! - `scoring` - keyword extraction and the combined score
//! - `error` - `SearchError`, one variant per failure kind

mod error;
pub mod hybrid;
pub mod scoring;

pub use error::{RetrievalPath, SearchError};
pub use hybrid::{merge_hits, rank, HybridSearchConfig, HybridSearchEngine, ScoredArtifact};
