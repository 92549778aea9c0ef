use thiserror::Error;

/// Which retrieval path failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalPath {
    Vector,
    Keyword,
}

impl std::fmt::Display for RetrievalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Keyword => write!(f, "keyword"),
        }
    }
}

/// Failure of a hybrid search request.
///
/// None of these are retried; each aborts the request with no partial result.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing or empty query, or a non-positive result count.
    /// Raised before any provider or store call.
    #[error("invalid search request: {0}")]
    Validation(String),

    /// The embedding provider produced no usable vector for the query
    #[error("failed to embed query: {0}")]
    Embedding(String),

    /// A store query failed or timed out
    #[error("{path} retrieval failed: {message}")]
    Retrieval {
        path: RetrievalPath,
        message: String,
    },
}

impl SearchError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Embedding(_) => "embedding",
            Self::Retrieval { .. } => "retrieval",
        }
    }

    pub(crate) fn retrieval(path: RetrievalPath, message: impl Into<String>) -> Self {
        Self::Retrieval {
            path,
            message: message.into(),
        }
    }
}
