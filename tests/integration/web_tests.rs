use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use heritage_lens::config::SearchConfig;
use heritage_lens::embeddings::{EmbeddingProvider, MockEmbedder};
use heritage_lens::search::{HybridSearchConfig, HybridSearchEngine};
use heritage_lens::web::{AppState, WebServer};
use heritage_lens::SearchService;

use crate::helpers::{hit, FailingEmbedder, ScriptedStore};

fn router(embedder: Arc<dyn EmbeddingProvider>, store: ScriptedStore) -> axum::Router {
    let provider = embedder.provider_name();
    let engine = HybridSearchEngine::new(embedder, Arc::new(store), HybridSearchConfig::default());
    let service = SearchService::new(Arc::new(engine), &SearchConfig::default());
    WebServer::new(AppState::new(Arc::new(service), provider)).router()
}

fn search_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/explorer/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_search_returns_results() {
    let store = ScriptedStore::new(
        vec![hit("A", "Scarab amulet", 0.9), hit("B", "Canopic jar", 0.7)],
        vec![hit("B", "Canopic jar", 3.0), hit("C", "Offering table", 2.0)],
    );
    let app = router(Arc::new(MockEmbedder::new(8)), store);

    let response = app
        .oneshot(search_request(r#"{"query": "ancient Egyptian pottery", "k": 2}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], "B");
    assert_eq!(results[0]["title"], "Canopic jar");
    assert_eq!(results[0]["region"], "Egypt");
    assert_eq!(results[0]["themes"][0], "funerary");
    assert!(results[0]["image_url"].is_null());
    assert!((results[0]["score"].as_f64().unwrap() - 3.7).abs() < 1e-4);
    assert_eq!(results[1]["id"], "C");
    assert_eq!(results[1]["vector_score"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn test_default_k_applies() {
    let hits: Vec<_> = (0..40)
        .map(|i| hit(&format!("id{}", i), "Shard", 1.0))
        .collect();
    let app = router(Arc::new(MockEmbedder::new(8)), ScriptedStore::new(hits, Vec::new()));

    let response = app.oneshot(search_request(r#"{"query": "shard"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_empty_query_is_bad_request() {
    let app = router(Arc::new(MockEmbedder::new(8)), ScriptedStore::empty());

    let response = app.oneshot(search_request(r#"{"query": ""}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["kind"], "validation");
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_missing_query_and_bad_k_are_bad_requests() {
    for payload in [r#"{"k": 3}"#, r#"{"query": "vase", "k": 0}"#, r#"{"query": "vase", "k": -2}"#] {
        let app = router(Arc::new(MockEmbedder::new(8)), ScriptedStore::empty());
        let response = app.oneshot(search_request(payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = router(Arc::new(MockEmbedder::new(8)), ScriptedStore::empty());

    let response = app.oneshot(search_request("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "validation");
}

#[tokio::test]
async fn test_embedding_failure_is_bad_gateway() {
    let app = router(Arc::new(FailingEmbedder), ScriptedStore::empty());

    let response = app.oneshot(search_request(r#"{"query": "vase"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["kind"], "embedding");
}

#[tokio::test]
async fn test_retrieval_failure_is_service_unavailable() {
    let app = router(Arc::new(MockEmbedder::new(8)), ScriptedStore::failing_both());

    let response = app.oneshot(search_request(r#"{"query": "vase"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["kind"], "retrieval");
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_health() {
    let app = router(Arc::new(MockEmbedder::new(8)), ScriptedStore::empty());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["embedding_provider"], "mock");
    assert_eq!(body.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    heritage_lens::metrics::register_metrics();
    let app = router(Arc::new(MockEmbedder::new(8)), ScriptedStore::empty());

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("heritage_lens_"));
}
