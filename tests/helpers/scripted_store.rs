use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use heritage_lens::storage::{RecordStore, SearchField, StoredHit};
use heritage_lens::Artifact;

/// Canned answer for one retrieval path
#[derive(Clone)]
enum Script {
    Hits(Vec<StoredHit>),
    Fail(String),
    Stall(Duration),
}

impl Script {
    async fn answer(&self, k: usize) -> Result<Vec<StoredHit>> {
        match self {
            Script::Hits(hits) => Ok(hits.iter().take(k).cloned().collect()),
            Script::Fail(message) => bail!("{}", message),
            Script::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Vec::new())
            }
        }
    }
}

/// In-memory `RecordStore` returning scripted hits and recording calls.
pub struct ScriptedStore {
    vector: Script,
    keyword: Script,
    calls: AtomicUsize,
    vector_requests: Mutex<Vec<(usize, usize)>>,
    keyword_requests: Mutex<Vec<(String, Vec<SearchField>, usize)>>,
}

impl ScriptedStore {
    pub fn new(vector_hits: Vec<StoredHit>, keyword_hits: Vec<StoredHit>) -> Self {
        Self::from_scripts(Script::Hits(vector_hits), Script::Hits(keyword_hits))
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Vector path fails, keyword path answers with `keyword_hits`
    pub fn failing_vector(keyword_hits: Vec<StoredHit>) -> Self {
        Self::from_scripts(
            Script::Fail("vector index unavailable".to_string()),
            Script::Hits(keyword_hits),
        )
    }

    /// Keyword path fails, vector path answers with `vector_hits`
    pub fn failing_keyword(vector_hits: Vec<StoredHit>) -> Self {
        Self::from_scripts(
            Script::Hits(vector_hits),
            Script::Fail("text index unavailable".to_string()),
        )
    }

    pub fn failing_both() -> Self {
        Self::from_scripts(
            Script::Fail("vector index unavailable".to_string()),
            Script::Fail("text index unavailable".to_string()),
        )
    }

    /// Vector path sleeps for `delay`, keyword path answers with `keyword_hits`
    pub fn stalled_vector(delay: Duration, keyword_hits: Vec<StoredHit>) -> Self {
        Self::from_scripts(Script::Stall(delay), Script::Hits(keyword_hits))
    }

    /// Keyword path sleeps for `delay`, vector path answers with `vector_hits`
    pub fn stalled_keyword(delay: Duration, vector_hits: Vec<StoredHit>) -> Self {
        Self::from_scripts(Script::Hits(vector_hits), Script::Stall(delay))
    }

    fn from_scripts(vector: Script, keyword: Script) -> Self {
        Self {
            vector,
            keyword,
            calls: AtomicUsize::new(0),
            vector_requests: Mutex::new(Vec::new()),
            keyword_requests: Mutex::new(Vec::new()),
        }
    }

    /// Total retrieval calls on either path
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(k, oversample)` of every vector query
    pub fn vector_requests(&self) -> Vec<(usize, usize)> {
        self.vector_requests.lock().unwrap().clone()
    }

    /// `(text, fields, k)` of every keyword query
    pub fn keyword_requests(&self) -> Vec<(String, Vec<SearchField>, usize)> {
        self.keyword_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn vector_search(
        &self,
        _vector: &[f32],
        k: usize,
        oversample: usize,
    ) -> Result<Vec<StoredHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vector_requests.lock().unwrap().push((k, oversample));
        self.vector.answer(k).await
    }

    async fn keyword_search(
        &self,
        text: &str,
        fields: &[SearchField],
        k: usize,
    ) -> Result<Vec<StoredHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keyword_requests
            .lock()
            .unwrap()
            .push((text.to_string(), fields.to_vec(), k));
        self.keyword.answer(k).await
    }
}

pub fn artifact(id: &str, title: &str) -> Artifact {
    Artifact {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("Description of {}", title),
        region: "Egypt".to_string(),
        period: "New Kingdom".to_string(),
        themes: vec!["funerary".to_string()],
        image_url: None,
        reference_link: None,
    }
}

pub fn hit(id: &str, title: &str, score: f32) -> StoredHit {
    StoredHit::new(artifact(id, title), score)
}
