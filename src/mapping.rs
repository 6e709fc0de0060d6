//! Mapping files: which photo goes into which category.
//!
//! Three input shapes are accepted and all end up as the same [`Mapping`]:
//!
//! ```yaml
//! # Flat YAML: filename → category
//! IMG_0001.jpg: street
//! IMG_0002.jpg: travel
//! ```
//!
//! ```yaml
//! # Grouped YAML: category → filenames
//! street: [IMG_0001.jpg, IMG_0003.jpg]
//! travel:
//!   - IMG_0002.jpg
//! ```
//!
//! ```text
//! # CSV with a header row ("category" works in place of "album")
//! photo,album
//! IMG_0001.jpg,street
//! IMG_0002.jpg,travel
//! ```
//!
//! The format comes from the file extension. A YAML file must use one shape
//! throughout; mixing them is rejected rather than guessed at.
//!
//! Names are joined onto the source and destination directories, so an
//! absolute path or a `..` component in either a filename or a category is
//! rejected up front.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Unsupported mapping format: {0} (expected .yaml, .yml or .csv)")]
    UnsupportedFormat(PathBuf),
    #[error("Malformed mapping {0}")]
    Malformed(String),
    #[error("Failed to read mapping {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// File formats a mapping can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    Yaml,
    Csv,
}

impl MappingFormat {
    /// Infer the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(MappingFormat::Yaml),
            "csv" => Some(MappingFormat::Csv),
            _ => None,
        }
    }
}

/// A mapping as written, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMapping {
    /// `(filename, category)` pairs.
    Flat(Vec<(String, String)>),
    /// `(category, filenames)` groups.
    Grouped(Vec<(String, Vec<String>)>),
}

/// One photo placed into one category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Assignment {
    pub filename: String,
    pub category: String,
}

/// Normalized mapping: assignments sorted by filename, then category.
///
/// A filename may appear under several categories; exact duplicates are
/// collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    assignments: Vec<Assignment>,
}

impl Mapping {
    /// Read and normalize a mapping file.
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let format = MappingFormat::from_path(path)
            .ok_or_else(|| MappingError::UnsupportedFormat(path.to_path_buf()))?;
        let content = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw = match format {
            MappingFormat::Yaml => parse_yaml(&content),
            MappingFormat::Csv => parse_csv(&content),
        };
        raw.and_then(Self::from_raw)
            .map_err(|reason| MappingError::Malformed(format!("{}: {}", path.display(), reason)))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, MappingError> {
        parse_yaml(content)
            .and_then(Self::from_raw)
            .map_err(MappingError::Malformed)
    }

    pub fn from_csv_str(content: &str) -> Result<Self, MappingError> {
        parse_csv(content)
            .and_then(Self::from_raw)
            .map_err(MappingError::Malformed)
    }

    /// Normalize either shape into sorted, validated assignments.
    fn from_raw(raw: RawMapping) -> Result<Self, String> {
        let pairs: Vec<(String, String)> = match raw {
            RawMapping::Flat(pairs) => pairs,
            RawMapping::Grouped(groups) => groups
                .into_iter()
                .flat_map(|(category, files)| {
                    files.into_iter().map(move |f| (f, category.clone()))
                })
                .collect(),
        };

        let mut assignments = Vec::with_capacity(pairs.len());
        for (filename, category) in pairs {
            let filename = validate_name(&filename, "filename")?;
            let category = validate_name(&category, "category")?;
            assignments.push(Assignment { filename, category });
        }
        assignments.sort();
        assignments.dedup();

        Ok(Self { assignments })
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Trim a name and reject empty, absolute or parent-escaping ones.
fn validate_name(name: &str, what: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty {what}"));
    }
    let path = Path::new(name);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || name.starts_with(['/', '\\']) {
        return Err(format!("unsafe {what} '{name}'"));
    }
    Ok(name.to_string())
}

// =============================================================================
// YAML
// =============================================================================

fn parse_yaml(content: &str) -> Result<RawMapping, String> {
    let value: serde_yaml::Value = if is_blank_yaml(content) {
        serde_yaml::Value::Null
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())?
    };

    let map = match value {
        serde_yaml::Value::Null => return Ok(RawMapping::Flat(Vec::new())),
        serde_yaml::Value::Mapping(map) => map,
        _ => return Err("top level must be a mapping".to_string()),
    };

    let mut flat = Vec::new();
    let mut grouped = Vec::new();

    for (key, value) in map {
        let key = yaml_scalar(&key).ok_or("keys must be plain names")?;
        match value {
            serde_yaml::Value::Sequence(items) => {
                let files = items
                    .iter()
                    .map(|item| {
                        yaml_scalar(item)
                            .ok_or_else(|| format!("entries under '{key}' must be plain names"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                grouped.push((key, files));
            }
            other => {
                let category = yaml_scalar(&other)
                    .ok_or_else(|| format!("value for '{key}' must be a name or a list"))?;
                flat.push((key, category));
            }
        }
    }

    match (flat.is_empty(), grouped.is_empty()) {
        (_, true) => Ok(RawMapping::Flat(flat)),
        (true, false) => Ok(RawMapping::Grouped(grouped)),
        (false, false) => Err(
            "mixes filename: category entries with category: [filenames] entries".to_string(),
        ),
    }
}

/// Strings and numbers are names; `0042.jpg` stays a string but `2024: [...]`
/// parses as a number key.
fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Nothing but whitespace, comments and document markers.
fn is_blank_yaml(content: &str) -> bool {
    content.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

// =============================================================================
// CSV
// =============================================================================

fn parse_csv(content: &str) -> Result<RawMapping, String> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let photo_col = column(&["photo"]).ok_or("missing 'photo' column in header")?;
    let album_col =
        column(&["album", "category"]).ok_or("missing 'album' column in header")?;

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        // Header is line 1
        let line = i + 2;
        let photo = record
            .get(photo_col)
            .ok_or_else(|| format!("line {line}: missing photo"))?;
        let album = record
            .get(album_col)
            .ok_or_else(|| format!("line {line}: missing album"))?;
        groups
            .entry(album.to_string())
            .or_default()
            .push(photo.to_string());
    }

    Ok(RawMapping::Grouped(groups.into_iter().collect()))
}
