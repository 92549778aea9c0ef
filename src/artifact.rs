//! Artifact records.
//!
//! `Artifact` is the normalized record the rest of the crate works with.
//! `RawArtifact` mirrors the loosely-typed documents found in ingest files,
//! where every key may be missing; normalization happens once, at the
//! boundary, so downstream code never deals with absent text fields.

use serde::{Deserialize, Serialize};

/// A cultural artifact record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Stable identifier assigned by the store when the record is created
    pub id: String,
    pub title: String,
    pub description: String,
    pub region: String,
    pub period: String,
    /// Display order is insertion order; duplicates are kept
    pub themes: Vec<String>,
    pub image_url: Option<String>,
    pub reference_link: Option<String>,
}

impl Artifact {
    /// Text the embedding is computed from: title, description and region
    /// joined by single spaces.
    pub fn embedding_text(&self) -> String {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.region.as_str(),
        ]
        .join(" ")
    }

    /// Key used to decide whether an ingested record already exists.
    pub fn natural_key(&self) -> (String, String) {
        (self.title.clone(), self.region.clone())
    }
}

/// Themes as found in ingest files: either a list or one comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawThemes {
    List(Vec<String>),
    Joined(String),
}

impl RawThemes {
    fn into_vec(self) -> Vec<String> {
        match self {
            RawThemes::List(themes) => themes,
            RawThemes::Joined(joined) => split_themes(&joined),
        }
    }
}

/// Split a comma-separated theme list, trimming entries and dropping empty ones.
pub fn split_themes(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// An artifact document before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArtifact {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub themes: Option<RawThemes>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub reference_link: Option<String>,
}

impl RawArtifact {
    /// Normalize into an `Artifact` with the given id.
    ///
    /// Missing text fields become empty strings, missing themes an empty list,
    /// and blank URLs are treated as absent.
    pub fn into_artifact(self, id: String) -> Artifact {
        Artifact {
            id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            region: self.region.unwrap_or_default(),
            period: self.period.unwrap_or_default(),
            themes: self.themes.map(RawThemes::into_vec).unwrap_or_default(),
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
            reference_link: self.reference_link.filter(|u| !u.trim().is_empty()),
        }
    }
}
