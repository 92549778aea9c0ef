use std::sync::Arc;

use crate::service::SearchService;

/// Shared application state.
///
/// Cloned per request; clients behind the `Arc`s are built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    /// Embedding provider name, reported by `/health`
    pub provider: &'static str,
}

impl AppState {
    pub fn new(search: Arc<SearchService>, provider: &'static str) -> Self {
        Self { search, provider }
    }
}
