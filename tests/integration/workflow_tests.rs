//! Ingest, embed and search against the on-disk store.

use anyhow::Result;
use std::sync::Arc;

use heritage_lens::indexing::EmbeddingJob;
use heritage_lens::ingest::ingest_file;
use heritage_lens::search::{HybridSearchConfig, HybridSearchEngine};
use heritage_lens::{SearchRequest, SearchService};

use crate::helpers::TestHarness;

const ARTIFACTS_JSON: &str = r#"[
    {"title": "Blue Vase", "description": "Porcelain vase with dragon motif", "region": "China",
     "period": "Ming", "themes": ["ceramics", "trade", "ceramics"], "image_url": "https://img.example/vase.jpg"},
    {"title": "Funerary Mask", "description": "Gold mask for a pharaoh", "region": "Egypt",
     "period": "New Kingdom", "themes": "gold, burial"},
    {"title": "Bronze Ding", "description": "Ritual cauldron", "region": "China"}
]"#;

const ARTIFACTS_CSV: &str = "title,description,region,period,themes\n\
Blue Vase,Duplicate of an existing record,China,Ming,ceramics\n\
Jade Cong,Ritual jade tube,China,Neolithic,\"ritual, jade\"\n";

fn service(harness: &TestHarness) -> SearchService {
    let engine = HybridSearchEngine::new(
        harness.embedder.clone(),
        harness.store.clone(),
        HybridSearchConfig::from(&harness.config.search),
    );
    SearchService::new(Arc::new(engine), &harness.config.search)
}

#[tokio::test]
async fn test_ingest_is_idempotent_across_formats() -> Result<()> {
    let harness = TestHarness::new().await?;
    let json = harness.create_test_file("artifacts.json", ARTIFACTS_JSON)?;
    let csv = harness.create_test_file("more.csv", ARTIFACTS_CSV)?;

    let first = ingest_file(&harness.store, &json)?;
    assert_eq!((first.inserted, first.skipped), (3, 0));

    let second = ingest_file(&harness.store, &csv)?;
    assert_eq!((second.inserted, second.skipped), (1, 1));

    let again = ingest_file(&harness.store, &json)?;
    assert_eq!((again.inserted, again.skipped), (0, 3));

    let stored = harness.store.all_artifacts()?;
    assert_eq!(stored.len(), 4);

    let vase = stored.iter().find(|a| a.title == "Blue Vase").unwrap();
    assert_eq!(vase.description, "Porcelain vase with dragon motif");
    assert_eq!(vase.themes, vec!["ceramics", "trade", "ceramics"]);
    assert!(!vase.id.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unsupported_file_rejected() -> Result<()> {
    let harness = TestHarness::new().await?;
    let file = harness.create_test_file("artifacts.xml", "<artifacts/>")?;

    assert!(ingest_file(&harness.store, &file).is_err());
    assert_eq!(harness.store.counts().await?.artifacts, 0);
    Ok(())
}

#[tokio::test]
async fn test_unembedded_artifacts_found_by_keyword_only() -> Result<()> {
    let harness = TestHarness::new().await?;
    let json = harness.create_test_file("artifacts.json", ARTIFACTS_JSON)?;
    ingest_file(&harness.store, &json)?;

    let response = service(&harness)
        .search(SearchRequest::new("pharaoh", None))
        .await?;

    assert_eq!(response.results.len(), 1);
    let mask = &response.results[0];
    assert_eq!(mask.artifact.title, "Funerary Mask");
    assert_eq!(mask.vector_score, 0.0);
    assert!(mask.text_score > 0.0);

    Ok(())
}

#[tokio::test]
async fn test_full_workflow() -> Result<()> {
    let harness = TestHarness::new().await?;
    let json = harness.create_test_file("artifacts.json", ARTIFACTS_JSON)?;
    ingest_file(&harness.store, &json)?;

    let job = EmbeddingJob::new(harness.store.clone(), harness.embedder.clone(), 2).quiet();
    let summary = job.run(false).await?;
    assert_eq!(summary.embedded, 3);

    let counts = harness.store.counts().await?;
    assert_eq!((counts.artifacts, counts.embedded), (3, 3));

    let response = service(&harness)
        .search(SearchRequest::new("blue vase", Some(3)))
        .await?;

    // Every embedded artifact is a vector candidate
    assert_eq!(response.results.len(), 3);

    let top = &response.results[0];
    assert_eq!(top.artifact.title, "Blue Vase");
    assert!(top.vector_score > 0.0);
    assert!(top.text_score > 0.0);
    assert_eq!(top.artifact.image_url.as_deref(), Some("https://img.example/vase.jpg"));

    for pair in response.results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    Ok(())
}

#[tokio::test]
async fn test_store_reopens_with_data() -> Result<()> {
    let harness = TestHarness::new().await?;
    let json = harness.create_test_file("artifacts.json", ARTIFACTS_JSON)?;
    ingest_file(&harness.store, &json)?;
    EmbeddingJob::new(harness.store.clone(), harness.embedder.clone(), 8)
        .quiet()
        .run(false)
        .await?;

    let reopened =
        heritage_lens::storage::ArtifactStore::open(&harness.config, harness.path()).await?;
    let counts = reopened.counts().await?;
    assert_eq!((counts.artifacts, counts.embedded), (3, 3));

    Ok(())
}
