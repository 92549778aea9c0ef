pub mod artifact;
pub mod cli;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod indexing;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod search;
pub mod service;
pub mod storage;
pub mod web;

pub use artifact::Artifact;
pub use config::Config;
pub use search::{HybridSearchEngine, ScoredArtifact, SearchError};
pub use service::{SearchRequest, SearchResponse, SearchService};
