//! Full-text artifact index using Tantivy.
//!
//! Every ingested artifact is stored here with all of its fields, so the
//! index doubles as the collection the embedding job reads from.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value as _, STORED, STRING, TEXT};
use tantivy::tokenizer::TokenStream as _;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info};

use super::{SearchField, StoredHit, KEYWORD_FIELDS};
use crate::artifact::Artifact;

/// Writer heap size in bytes
const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Clone)]
struct ArtifactSchema {
    schema: Schema,
    id: Field,
    title: Field,
    description: Field,
    region: Field,
    period: Field,
    themes: Field,
    image_url: Field,
    reference_link: Field,
}

impl ArtifactSchema {
    fn new() -> Self {
        let mut builder = Schema::builder();

        let id = builder.add_text_field("id", STRING | STORED);
        let title = builder.add_text_field("title", TEXT | STORED);
        let description = builder.add_text_field("description", TEXT | STORED);
        let region = builder.add_text_field("region", TEXT | STORED);
        let period = builder.add_text_field("period", STORED);
        let themes = builder.add_text_field("themes", STORED);
        let image_url = builder.add_text_field("image_url", STORED);
        let reference_link = builder.add_text_field("reference_link", STORED);

        Self {
            schema: builder.build(),
            id,
            title,
            description,
            region,
            period,
            themes,
            image_url,
            reference_link,
        }
    }

    fn field(&self, field: SearchField) -> Field {
        match field {
            SearchField::Title => self.title,
            SearchField::Description => self.description,
            SearchField::Region => self.region,
        }
    }

    fn to_document(&self, artifact: &Artifact) -> Result<TantivyDocument> {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.id, &artifact.id);
        doc.add_text(self.title, &artifact.title);
        doc.add_text(self.description, &artifact.description);
        doc.add_text(self.region, &artifact.region);
        doc.add_text(self.period, &artifact.period);
        doc.add_text(
            self.themes,
            serde_json::to_string(&artifact.themes).context("Failed to encode themes")?,
        );
        if let Some(url) = &artifact.image_url {
            doc.add_text(self.image_url, url);
        }
        if let Some(link) = &artifact.reference_link {
            doc.add_text(self.reference_link, link);
        }
        Ok(doc)
    }

    fn to_artifact(&self, doc: &TantivyDocument) -> Artifact {
        let text = |field: Field| -> Option<String> {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let themes = text(self.themes)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();

        Artifact {
            id: text(self.id).unwrap_or_default(),
            title: text(self.title).unwrap_or_default(),
            description: text(self.description).unwrap_or_default(),
            region: text(self.region).unwrap_or_default(),
            period: text(self.period).unwrap_or_default(),
            themes,
            image_url: text(self.image_url),
            reference_link: text(self.reference_link),
        }
    }
}

/// Tantivy index over all artifacts.
///
/// The writer is only held while `add_artifacts` runs, so several processes
/// may keep the index open for reading.
pub struct KeywordIndex {
    index: Index,
    schema: ArtifactSchema,
    reader: IndexReader,
}

impl KeywordIndex {
    /// Create or open a keyword index in the given directory.
    pub fn new(index_path: &Path) -> Result<Self> {
        let schema = ArtifactSchema::new();

        let index = if index_path.join("meta.json").exists() {
            info!("Opening existing keyword index at {:?}", index_path);
            Index::open_in_dir(index_path)
                .with_context(|| format!("Failed to open keyword index at {:?}", index_path))?
        } else {
            info!("Creating new keyword index at {:?}", index_path);
            std::fs::create_dir_all(index_path).with_context(|| {
                format!("Failed to create keyword index directory {:?}", index_path)
            })?;
            Index::create_in_dir(index_path, schema.schema.clone())
                .with_context(|| format!("Failed to create keyword index at {:?}", index_path))?
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .with_context(|| "Failed to create index reader")?;

        Ok(Self {
            index,
            schema,
            reader,
        })
    }

    /// Add artifacts, replacing any stored under the same id, and commit.
    pub fn add_artifacts(&self, artifacts: &[Artifact]) -> Result<()> {
        let mut writer: IndexWriter = self
            .index
            .writer(WRITER_HEAP_BYTES)
            .with_context(|| "Failed to create index writer")?;

        for artifact in artifacts {
            writer.delete_term(Term::from_field_text(self.schema.id, &artifact.id));
            writer.add_document(self.schema.to_document(artifact)?)?;
        }

        writer
            .commit()
            .with_context(|| "Failed to commit keyword index changes")?;

        self.reader
            .reload()
            .with_context(|| "Failed to reload index reader")?;

        debug!("Committed {} artifacts to keyword index", artifacts.len());
        Ok(())
    }

    /// Number of artifacts visible to readers
    pub fn count(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }

    /// Every stored artifact
    pub fn all_artifacts(&self) -> Result<Vec<Artifact>> {
        let searcher = self.reader.searcher();
        let total = searcher.num_docs() as usize;
        if total == 0 {
            return Ok(Vec::new());
        }

        let top_docs = searcher
            .search(&AllQuery, &TopDocs::with_limit(total))
            .with_context(|| "Failed to enumerate keyword index")?;

        top_docs
            .into_iter()
            .map(|(_, address)| {
                let doc: TantivyDocument = searcher
                    .doc(address)
                    .with_context(|| "Failed to retrieve document")?;
                Ok(self.schema.to_artifact(&doc))
            })
            .collect()
    }

    /// Full-text search over the given fields (all keyword fields if empty).
    ///
    /// The text is taken literally: it is split with each field's tokenizer
    /// and any matching term scores, so words such as `AND` or a leading `-`
    /// carry no query-syntax meaning.
    pub fn search(&self, query: &str, fields: &[SearchField], limit: usize) -> Result<Vec<StoredHit>> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let fields = if fields.is_empty() {
            &KEYWORD_FIELDS[..]
        } else {
            fields
        };

        let term_query = self.literal_query(query, fields)?;
        if term_query.clauses().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&term_query, &TopDocs::with_limit(limit))
            .with_context(|| "Failed to execute keyword search")?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .with_context(|| "Failed to retrieve document")?;
            results.push(StoredHit::new(self.schema.to_artifact(&doc), score));
        }

        debug!("Keyword search returned {} results", results.len());
        Ok(results)
    }

    /// Disjunction of one term query per distinct token per field
    fn literal_query(&self, query: &str, fields: &[SearchField]) -> Result<BooleanQuery> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for field in fields {
            let field = self.schema.field(*field);
            let mut analyzer = self
                .index
                .tokenizer_for_field(field)
                .with_context(|| "Failed to get field tokenizer")?;

            let mut tokens = HashSet::new();
            let mut stream = analyzer.token_stream(query);
            stream.process(&mut |token| {
                tokens.insert(token.text.clone());
            });

            for token in tokens {
                clauses.push((
                    Occur::Should,
                    Box::new(TermQuery::new(
                        Term::from_field_text(field, &token),
                        IndexRecordOption::WithFreqs,
                    )),
                ));
            }
        }

        Ok(BooleanQuery::new(clauses))
    }
}
