//! HTTP request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::state::AppState;
use crate::metrics;
use crate::search::SearchError;
use crate::service::SearchRequest;

/// Error body: `{"error": <message>, "kind": <kind>}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub embedding_provider: String,
}

/// A search failure rendered as an HTTP response.
pub struct ApiError(pub SearchError);

impl ApiError {
    /// Status code for each error kind
    pub fn status(&self) -> StatusCode {
        match self.0 {
            SearchError::Validation(_) => StatusCode::BAD_REQUEST,
            SearchError::Embedding(_) => StatusCode::BAD_GATEWAY,
            SearchError::Retrieval { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.0.kind(), error = %self.0, "Search request failed");
        } else {
            warn!(kind = self.0.kind(), error = %self.0, "Search request rejected");
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handle search requests.
///
/// POST /api/explorer/search
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| SearchError::Validation(rejection.body_text()))?;

    info!(
        query = request.query.as_deref().unwrap_or_default(),
        k = ?request.k,
        "Processing search request"
    );

    let response = state.search.search(request).await?;
    Ok(Json(response))
}

/// Health check endpoint.
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        embedding_provider: state.provider.to_string(),
    })
}

/// Prometheus metrics endpoint.
///
/// GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    let output = metrics::gather_metrics();
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], output)
}
