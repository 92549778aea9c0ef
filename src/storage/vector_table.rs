use anyhow::{anyhow, bail, Context, Result};
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{connect, Connection, Table};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::StoredHit;
use crate::artifact::Artifact;

const TABLE_NAME: &str = "artifacts";
/// Upper bound used when counting rows fails.
const MAX_QUERY_ROWS: usize = 10_000_000;

/// An artifact paired with the embedding of its text.
#[derive(Debug, Clone)]
pub struct EmbeddedArtifact {
    pub artifact: Artifact,
    pub vector: Vec<f32>,
}

/// LanceDB table of embedded artifacts.
///
/// Only artifacts that have been through an embedding job live here, which is
/// what makes un-embedded records invisible to vector search.
pub struct VectorTable {
    db: Connection,
    dimension: usize,
}

impl VectorTable {
    /// Create or open a LanceDB database at the given path
    pub async fn new(path: &Path, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            bail!("Vector dimension must be positive");
        }

        let path_str = path.to_string_lossy();

        info!("Opening LanceDB at: {}", path_str);

        let db = connect(&path_str)
            .execute()
            .await
            .with_context(|| format!("Failed to connect to LanceDB at {}", path_str))?;

        Ok(Self { db, dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The artifacts table, or `None` before anything has been embedded
    async fn existing_table(&self) -> Result<Option<Table>> {
        let table_names = self.db.table_names().execute().await?;

        if !table_names.contains(&TABLE_NAME.to_string()) {
            return Ok(None);
        }

        debug!("Opening existing table: {}", TABLE_NAME);
        self.db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map(Some)
            .with_context(|| format!("Failed to open table {}", TABLE_NAME))
    }

    async fn get_or_create_table(&self) -> Result<Table> {
        if let Some(table) = self.existing_table().await? {
            Ok(table)
        } else {
            debug!("Creating new table: {}", TABLE_NAME);
            let batches = RecordBatchIterator::new(vec![], Arc::new(self.table_schema()));
            self.db
                .create_table(TABLE_NAME, Box::new(batches))
                .execute()
                .await
                .with_context(|| "Failed to create artifacts table")
        }
    }

    async fn row_count_or_max(table: &Table) -> usize {
        match table.count_rows(None).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = MAX_QUERY_ROWS,
                    "Failed to count rows, using fallback limit"
                );
                MAX_QUERY_ROWS
            }
        }
    }

    fn table_schema(&self) -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, false),
            Field::new("period", DataType::Utf8, false),
            // JSON-encoded list, keeps order and duplicates
            Field::new("themes", DataType::Utf8, false),
            Field::new("image_url", DataType::Utf8, true),
            Field::new("reference_link", DataType::Utf8, true),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dimension as i32,
                ),
                false,
            ),
        ])
    }

    fn to_record_batch(&self, items: &[EmbeddedArtifact]) -> Result<RecordBatch> {
        for item in items {
            if item.vector.len() != self.dimension {
                bail!(
                    "Embedding for artifact {} has {} dimensions, expected {}",
                    item.artifact.id,
                    item.vector.len(),
                    self.dimension
                );
            }
        }

        let themes = items
            .iter()
            .map(|i| serde_json::to_string(&i.artifact.themes))
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to encode themes")?;

        let column = |f: fn(&Artifact) -> &str| -> StringArray {
            StringArray::from(items.iter().map(|i| f(&i.artifact)).collect::<Vec<&str>>())
        };

        let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            items
                .iter()
                .map(|i| Some(i.vector.iter().map(|&v| Some(v)))),
            self.dimension as i32,
        );

        RecordBatch::try_new(
            Arc::new(self.table_schema()),
            vec![
                Arc::new(column(|a| a.id.as_str())),
                Arc::new(column(|a| a.title.as_str())),
                Arc::new(column(|a| a.description.as_str())),
                Arc::new(column(|a| a.region.as_str())),
                Arc::new(column(|a| a.period.as_str())),
                Arc::new(StringArray::from(themes)),
                Arc::new(StringArray::from(
                    items
                        .iter()
                        .map(|i| i.artifact.image_url.as_deref())
                        .collect::<Vec<Option<&str>>>(),
                )),
                Arc::new(StringArray::from(
                    items
                        .iter()
                        .map(|i| i.artifact.reference_link.as_deref())
                        .collect::<Vec<Option<&str>>>(),
                )),
                Arc::new(vector_array),
            ],
        )
        .with_context(|| "Failed to create RecordBatch")
    }

    /// Insert embedded artifacts, replacing any existing rows with the same ids
    pub async fn upsert(&self, items: Vec<EmbeddedArtifact>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let batch = self.to_record_batch(&items)?;
        let table = self.get_or_create_table().await?;

        let ids: Vec<&str> = items.iter().map(|i| i.artifact.id.as_str()).collect();
        table
            .delete(&id_filter(&ids))
            .await
            .with_context(|| "Failed to remove stale embeddings")?;

        let batches = RecordBatchIterator::new(vec![Ok(batch)], Arc::new(self.table_schema()));
        table
            .add(Box::new(batches))
            .execute()
            .await
            .with_context(|| "Failed to insert embedded artifacts")?;

        info!("Stored embeddings for {} artifacts", items.len());
        Ok(())
    }

    /// Nearest-neighbor search; results are ordered by similarity, best first.
    ///
    /// Similarity is `1 / (1 + distance)`.
    pub async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<StoredHit>> {
        if vector.len() != self.dimension {
            bail!(
                "Query vector has {} dimensions, table expects {}",
                vector.len(),
                self.dimension
            );
        }

        let Some(table) = self.existing_table().await? else {
            return Ok(Vec::new());
        };

        let results = table
            .vector_search(vector.to_vec())
            .with_context(|| "Failed to create vector search query")?
            .limit(limit)
            .execute()
            .await
            .with_context(|| "Failed to execute vector search")?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .with_context(|| "Failed to collect search results")?;

        let mut hits = Vec::new();

        for batch in batches {
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

            let artifacts = decode_artifacts(&batch)?;
            for (i, artifact) in artifacts.into_iter().enumerate() {
                let score = distances
                    .map(|d| 1.0 / (1.0 + d.value(i)))
                    .unwrap_or(1.0);
                hits.push(StoredHit::new(artifact, score));
            }
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(hits)
    }

    /// Ids of all artifacts that currently have an embedding
    pub async fn embedded_ids(&self) -> Result<HashSet<String>> {
        let Some(table) = self.existing_table().await? else {
            return Ok(HashSet::new());
        };
        let total_rows = Self::row_count_or_max(&table).await;

        let results = table
            .query()
            .select(Select::Columns(vec!["id".to_string()]))
            .limit(total_rows)
            .execute()
            .await
            .with_context(|| "Failed to query embedded ids")?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .with_context(|| "Failed to collect embedded ids")?;

        let mut ids = HashSet::new();
        for batch in batches {
            let column = string_column(&batch, "id")?;
            for i in 0..batch.num_rows() {
                ids.insert(column.value(i).to_string());
            }
        }

        Ok(ids)
    }

    /// Number of embedded artifacts
    pub async fn count(&self) -> Result<usize> {
        let Some(table) = self.existing_table().await? else {
            return Ok(0);
        };

        table
            .count_rows(None)
            .await
            .with_context(|| "Failed to count embedded artifacts")
    }

    /// Drop every stored embedding
    pub async fn clear(&self) -> Result<()> {
        let table_names = self.db.table_names().execute().await?;

        if table_names.contains(&TABLE_NAME.to_string()) {
            self.db
                .drop_table(TABLE_NAME)
                .await
                .with_context(|| "Failed to drop artifacts table")?;
        }

        info!("Cleared all embeddings");
        Ok(())
    }
}

/// SQL predicate matching any of the given ids
fn id_filter(ids: &[&str]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("'{}'", id.replace('\'', "''")))
        .collect();
    format!("id IN ({})", quoted.join(", "))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("Missing {} column", name))
}

fn optional_value(column: &StringArray, row: usize) -> Option<String> {
    if column.is_null(row) {
        None
    } else {
        Some(column.value(row).to_string())
    }
}

fn decode_artifacts(batch: &RecordBatch) -> Result<Vec<Artifact>> {
    let ids = string_column(batch, "id")?;
    let titles = string_column(batch, "title")?;
    let descriptions = string_column(batch, "description")?;
    let regions = string_column(batch, "region")?;
    let periods = string_column(batch, "period")?;
    let themes = string_column(batch, "themes")?;
    let image_urls = string_column(batch, "image_url")?;
    let reference_links = string_column(batch, "reference_link")?;

    (0..batch.num_rows())
        .map(|i| {
            let themes: Vec<String> = serde_json::from_str(themes.value(i))
                .with_context(|| format!("Malformed themes for artifact {}", ids.value(i)))?;

            Ok(Artifact {
                id: ids.value(i).to_string(),
                title: titles.value(i).to_string(),
                description: descriptions.value(i).to_string(),
                region: regions.value(i).to_string(),
                period: periods.value(i).to_string(),
                themes,
                image_url: optional_value(image_urls, i),
                reference_link: optional_value(reference_links, i),
            })
        })
        .collect()
}
