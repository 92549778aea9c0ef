//! Artifact file loading.
//!
//! Reads `.json` (an array of artifact objects) or `.csv` files into
//! [`RawArtifact`]s and stores them with upsert-if-absent semantics. Ingestion
//! never computes embeddings; run the embedding job afterwards.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

use crate::artifact::{split_themes, RawArtifact, RawThemes};
use crate::storage::{ArtifactStore, InsertSummary};

const BOM: char = '\u{feff}';

/// Supported ingest file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Csv,
}

impl SourceFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => bail!(
                "Unsupported file type {:?}; supply a .csv or .json file",
                path
            ),
        }
    }
}

/// Load raw artifact records from a file.
pub fn load_records(path: &Path) -> Result<Vec<RawArtifact>> {
    let format = SourceFormat::from_path(path)?;
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);

    let records = match format {
        SourceFormat::Json => parse_json(reader),
        SourceFormat::Csv => parse_csv(reader),
    }
    .with_context(|| format!("Failed to parse {:?}", path))?;

    info!(path = %path.display(), records = records.len(), "Loaded artifact file");
    Ok(records)
}

/// Load a file and store every artifact not already present.
pub fn ingest_file(store: &ArtifactStore, path: &Path) -> Result<InsertSummary> {
    let records = load_records(path)?;
    store.insert_if_absent(records)
}

/// Parse a JSON array of artifact objects.
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<RawArtifact>> {
    serde_json::from_reader(reader).context("Expected a JSON array of artifact objects")
}

/// Parse a CSV file with a header row.
///
/// Header names are trimmed, lower-cased and stripped of quotes; a leading
/// byte-order mark is ignored. Cell values are trimmed and stripped of quotes.
/// `themes` is a comma-separated list. Unknown columns are ignored.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawArtifact>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(normalize_header)
        .collect();

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed CSV row {}", line + 2))?;

        let cells: HashMap<&str, String> = headers
            .iter()
            .map(String::as_str)
            .zip(row.iter().map(clean_value))
            .collect();

        if cells.values().all(String::is_empty) {
            warn!(row = line + 2, "Skipping empty CSV row");
            continue;
        }

        let text = |key: &str| cells.get(key).cloned();

        records.push(RawArtifact {
            title: text("title"),
            description: text("description"),
            region: text("region"),
            period: text("period"),
            themes: text("themes").map(|t| RawThemes::List(split_themes(&t))),
            image_url: text("image_url"),
            reference_link: text("reference_link"),
        });
    }

    Ok(records)
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches(BOM)
        .replace('"', "")
        .trim()
        .to_lowercase()
}

fn clean_value(value: &str) -> String {
    value.replace('"', "").trim().to_string()
}
