//! Serialized data model shared by the builder and the index document.
//!
//! Field order here is the field order in the written JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One processed image inside an album, category or date bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    /// Base name of the file, unique within its collection.
    pub filename: String,
    pub title: String,
    /// Serialized as `YYYY-MM-DD`; omitted when no source yielded a date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Reference to the full-size image.
    pub path: String,
    /// Reference to the generated JPEG thumbnail.
    pub thumbnail: String,
}

/// One album, category or date bucket in the index document.
///
/// Fields this tool does not know about (added by hand or by another tool)
/// are kept in `extra` so a load/save cycle does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub photos: Vec<PhotoEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexEntry {
    /// Build an entry whose cover is the first photo's thumbnail.
    pub fn new(id: impl Into<String>, title: impl Into<String>, photos: Vec<PhotoEntry>) -> Self {
        let cover = photos
            .first()
            .map(|p| p.thumbnail.clone())
            .unwrap_or_default();
        Self {
            id: id.into(),
            title: title.into(),
            cover,
            photos,
            extra: Map::new(),
        }
    }
}
