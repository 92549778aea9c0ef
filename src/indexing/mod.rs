//! Batch embedding of stored artifacts

mod embed_job;

pub use embed_job::{EmbedSummary, EmbeddingJob};
