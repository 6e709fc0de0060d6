//! The persisted JSON index document.
//!
//! Each invocation of the builder does one read-modify-write cycle:
//!
//! ```text
//! IndexRepository::load()  →  upsert(document, entry)  →  IndexRepository::save()
//!        (I/O)                      (pure)                      (I/O)
//! ```
//!
//! ## Layouts
//!
//! Albums are stored as a list under a top-level `albums` key, which is the
//! layout the gallery front end reads:
//!
//! ```json
//! { "albums": [ { "id": "fu-mountain", "title": "...", "cover": "...", "photos": [...] } ] }
//! ```
//!
//! An album index that is a bare top-level array of entries is also read,
//! and saved back as an array.
//!
//! Categories and date buckets are stored as an object keyed by id, with keys
//! in sorted order:
//!
//! ```json
//! { "street": { "id": "street", ... }, "travel": { "id": "travel", ... } }
//! ```
//!
//! ## Recovery
//!
//! A document that cannot be read or parsed is treated as empty and the
//! caller is told so through [`LoadedDocument::recovered`]. The prior
//! entries are lost on the next save; there is no partial salvage.
//!
//! Saving goes through a temporary file in the same directory followed by a
//! rename, so readers never observe a half-written document.

use crate::types::IndexEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to create index directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Failed to write index {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a collection is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Album,
    Category,
    Date,
}

impl IndexKind {
    /// Directory segment under the destination and thumbnail roots.
    pub fn section(self) -> &'static str {
        match self {
            IndexKind::Album => "albums",
            IndexKind::Category => "categories",
            IndexKind::Date => "dates",
        }
    }

    /// File name of the document inside the index directory.
    pub fn default_filename(self) -> &'static str {
        match self {
            IndexKind::Album => "by-album.json",
            IndexKind::Category => "by-category.json",
            IndexKind::Date => "by-date.json",
        }
    }

    /// Lowercase name used in log and summary lines.
    pub fn label(self) -> &'static str {
        match self {
            IndexKind::Album => "album",
            IndexKind::Category => "category",
            IndexKind::Date => "date bucket",
        }
    }
}

/// Default document path for a kind inside `index_dir`.
pub fn default_index_path(index_dir: &Path, kind: IndexKind) -> PathBuf {
    index_dir.join(kind.default_filename())
}

/// In-memory form of an index document.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// `{"albums": [...]}`. Other top-level keys ride along in `extra`.
    Albums {
        albums: Vec<IndexEntry>,
        extra: Map<String, Value>,
    },
    /// `[entry, ...]`: an album index written as a bare array. Saved back
    /// in the same shape.
    AlbumList(Vec<IndexEntry>),
    /// `{"<id>": entry, ...}`
    Keyed(BTreeMap<String, IndexEntry>),
}

#[derive(Deserialize)]
struct AlbumsFile {
    #[serde(default)]
    albums: Vec<IndexEntry>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AlbumsOnDisk {
    List(Vec<IndexEntry>),
    Wrapped(AlbumsFile),
}

#[derive(Serialize)]
struct AlbumsFileRef<'a> {
    albums: &'a [IndexEntry],
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

impl Document {
    /// An empty document in the layout for `kind`.
    pub fn empty(kind: IndexKind) -> Self {
        match kind {
            IndexKind::Album => Document::Albums {
                albums: Vec::new(),
                extra: Map::new(),
            },
            IndexKind::Category | IndexKind::Date => Document::Keyed(BTreeMap::new()),
        }
    }

    /// All entries in document order.
    pub fn entries(&self) -> Vec<&IndexEntry> {
        match self {
            Document::Albums { albums, .. } | Document::AlbumList(albums) => {
                albums.iter().collect()
            }
            Document::Keyed(map) => map.values().collect(),
        }
    }

    /// Look up an entry by id (the first one, for album lists).
    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        match self {
            Document::Albums { albums, .. } | Document::AlbumList(albums) => {
                albums.iter().find(|e| e.id == id)
            }
            Document::Keyed(map) => map.get(id),
        }
    }

    fn parse(kind: IndexKind, content: &str) -> Result<Self, serde_json::Error> {
        match kind {
            IndexKind::Album => match serde_json::from_str(content)? {
                AlbumsOnDisk::List(albums) => Ok(Document::AlbumList(albums)),
                AlbumsOnDisk::Wrapped(file) => Ok(Document::Albums {
                    albums: file.albums,
                    extra: file.extra,
                }),
            },
            IndexKind::Category | IndexKind::Date => {
                Ok(Document::Keyed(serde_json::from_str(content)?))
            }
        }
    }

    /// Pretty JSON (2-space indent, non-ASCII kept literal) plus a trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = match self {
            Document::Albums { albums, extra } => {
                serde_json::to_string_pretty(&AlbumsFileRef { albums, extra })?
            }
            Document::AlbumList(albums) => serde_json::to_string_pretty(albums)?,
            Document::Keyed(map) => serde_json::to_string_pretty(map)?,
        };
        json.push('\n');
        Ok(json)
    }
}

/// Insert or replace the entry for `entry.id`.
///
/// - Entries for other ids are left exactly as they were.
/// - The first existing entry with the same id is replaced in place; any
///   later duplicates are dropped.
/// - Unknown fields on the replaced entry are carried over onto the new one.
pub fn upsert(document: Document, mut entry: IndexEntry) -> Document {
    match document {
        Document::Albums { mut albums, extra } => {
            upsert_list(&mut albums, entry);
            Document::Albums { albums, extra }
        }
        Document::AlbumList(mut albums) => {
            upsert_list(&mut albums, entry);
            Document::AlbumList(albums)
        }
        Document::Keyed(mut map) => {
            if let Some(previous) = map.get(&entry.id) {
                carry_extra(&mut entry, previous);
            }
            map.insert(entry.id.clone(), entry);
            Document::Keyed(map)
        }
    }
}

fn upsert_list(albums: &mut Vec<IndexEntry>, mut entry: IndexEntry) {
    match albums.iter().position(|e| e.id == entry.id) {
        Some(pos) => {
            carry_extra(&mut entry, &albums[pos]);
            let id = entry.id.clone();
            albums[pos] = entry;
            let mut seen = false;
            albums.retain(|e| {
                if e.id != id {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        }
        None => albums.push(entry),
    }
}

fn carry_extra(entry: &mut IndexEntry, previous: &IndexEntry) {
    for (key, value) in &previous.extra {
        entry
            .extra
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

/// Result of [`IndexRepository::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub document: Document,
    /// True when an existing document was unreadable and has been reset.
    pub recovered: bool,
}

/// File-backed storage for one index document.
#[derive(Debug, Clone)]
pub struct IndexRepository {
    path: PathBuf,
    kind: IndexKind,
}

impl IndexRepository {
    pub fn new(path: impl Into<PathBuf>, kind: IndexKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Load the document. Missing files give an empty document; unreadable
    /// or malformed files give an empty document with `recovered` set.
    pub fn load(&self) -> LoadedDocument {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return LoadedDocument {
                    document: Document::empty(self.kind),
                    recovered: false,
                };
            }
            Err(e) => {
                log::warn!(
                    "Could not read index {}: {}. Starting from an empty index",
                    self.path.display(),
                    e
                );
                return self.recovered();
            }
        };

        match Document::parse(self.kind, &content) {
            Ok(document) => LoadedDocument {
                document,
                recovered: false,
            },
            Err(e) => {
                log::warn!(
                    "Index {} is not a valid {} index ({}). Starting from an empty index",
                    self.path.display(),
                    self.kind.label(),
                    e
                );
                self.recovered()
            }
        }
    }

    fn recovered(&self) -> LoadedDocument {
        LoadedDocument {
            document: Document::empty(self.kind),
            recovered: true,
        }
    }

    /// Write the document atomically: temp file in the same directory, then rename.
    pub fn save(&self, document: &Document) -> Result<(), IndexError> {
        let json = document.to_json()?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| IndexError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let write_err = |source| IndexError::Write {
            path: self.path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        self.match_permissions(&tmp).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Temp files are created owner-only; give the index the permissions
    /// of the file it replaces, or ordinary world-readable ones.
    #[cfg(unix)]
    fn match_permissions(&self, tmp: &NamedTempFile) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&self.path)
            .map(|m| m.permissions().mode())
            .unwrap_or(0o644);
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn match_permissions(&self, _tmp: &NamedTempFile) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PhotoEntry;
    use tempfile::TempDir;

    fn photo(id: &str, name: &str) -> PhotoEntry {
        PhotoEntry {
            filename: format!("{name}.jpg"),
            title: name.to_string(),
            date: None,
            path: format!("site/albums/{id}/{name}.jpg"),
            thumbnail: format!("site/thumbnails/albums/{id}/{name}.jpg"),
        }
    }

    fn entry(id: &str, photos: &[&str]) -> IndexEntry {
        IndexEntry::new(
            id,
            id.to_uppercase(),
            photos.iter().map(|p| photo(id, p)).collect(),
        )
    }

    fn ids(document: &Document) -> Vec<&str> {
        document.entries().iter().map(|e| e.id.as_str()).collect()
    }

    // =========================================================================
    // IndexKind
    // =========================================================================

    #[test]
    fn kind_sections_and_filenames() {
        assert_eq!(IndexKind::Album.section(), "albums");
        assert_eq!(IndexKind::Category.section(), "categories");
        assert_eq!(IndexKind::Date.section(), "dates");
        assert_eq!(
            default_index_path(Path::new("data/photos"), IndexKind::Category),
            PathBuf::from("data/photos/by-category.json")
        );
    }

    // =========================================================================
    // upsert
    // =========================================================================

    #[test]
    fn upsert_appends_new_album() {
        let doc = Document::empty(IndexKind::Album);
        let doc = upsert(doc, entry("a", &["1"]));
        let doc = upsert(doc, entry("b", &["1"]));
        assert_eq!(ids(&doc), vec!["a", "b"]);
    }

    #[test]
    fn upsert_replaces_album_in_place() {
        let doc = Document::empty(IndexKind::Album);
        let doc = upsert(doc, entry("a", &["1"]));
        let doc = upsert(doc, entry("b", &["1"]));
        let doc = upsert(doc, entry("a", &["2", "3"]));

        assert_eq!(ids(&doc), vec!["a", "b"]);
        assert_eq!(doc.get("a").unwrap().photos.len(), 2);
    }

    #[test]
    fn upsert_is_idempotent() {
        let once = upsert(Document::empty(IndexKind::Album), entry("a", &["1"]));
        let twice = upsert(once.clone(), entry("a", &["1"]));
        assert_eq!(once, twice);
    }

    #[test]
    fn upsert_leaves_other_entries_untouched() {
        let doc = upsert(Document::empty(IndexKind::Category), entry("a", &["1"]));
        let before = doc.get("a").cloned();
        let doc = upsert(doc, entry("b", &["9"]));
        assert_eq!(doc.get("a").cloned(), before);
    }

    #[test]
    fn upsert_collapses_existing_duplicates() {
        let doc = Document::Albums {
            albums: vec![entry("a", &["1"]), entry("b", &["1"]), entry("a", &["2"])],
            extra: Map::new(),
        };
        let doc = upsert(doc, entry("a", &["3"]));

        assert_eq!(ids(&doc), vec!["a", "b"]);
        assert_eq!(doc.get("a").unwrap().photos[0].filename, "3.jpg");
    }

    #[test]
    fn upsert_keyed_is_sorted_by_id() {
        let doc = Document::empty(IndexKind::Date);
        let doc = upsert(doc, entry("2025-02", &[]));
        let doc = upsert(doc, entry("2024-12", &[]));
        assert_eq!(ids(&doc), vec!["2024-12", "2025-02"]);
    }

    #[test]
    fn upsert_carries_unknown_fields_of_replaced_entry() {
        let mut old = entry("a", &["1"]);
        old.extra
            .insert("description".into(), Value::String("Kept".into()));
        let doc = upsert(Document::empty(IndexKind::Album), old);

        let doc = upsert(doc, entry("a", &["2"]));
        assert_eq!(doc.get("a").unwrap().extra["description"], "Kept");
    }

    // =========================================================================
    // load / save
    // =========================================================================

    #[test]
    fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let repo = IndexRepository::new(tmp.path().join("by-album.json"), IndexKind::Album);

        let loaded = repo.load();
        assert!(!loaded.recovered);
        assert!(loaded.document.entries().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty_and_recovered() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("by-album.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded = IndexRepository::new(&path, IndexKind::Album).load();
        assert!(loaded.recovered);
        assert!(loaded.document.entries().is_empty());
    }

    #[test]
    fn wrong_shape_is_treated_as_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("by-category.json");
        fs::write(&path, r#"["not", "an", "object"]"#).unwrap();

        let loaded = IndexRepository::new(&path, IndexKind::Category).load();
        assert!(loaded.recovered);
    }

    #[test]
    fn save_then_load_preserves_document() {
        let tmp = TempDir::new().unwrap();
        let repo = IndexRepository::new(
            tmp.path().join("nested/dir/by-album.json"),
            IndexKind::Album,
        );
        let doc = upsert(Document::empty(IndexKind::Album), entry("a", &["1", "2"]));

        repo.save(&doc).unwrap();
        let loaded = repo.load();
        assert!(!loaded.recovered);
        assert_eq!(loaded.document, doc);
    }

    #[test]
    fn save_writes_pretty_json_with_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("by-album.json");
        let repo = IndexRepository::new(&path, IndexKind::Album);
        let mut e = entry("fu-mountain", &["1"]);
        e.title = "福山步道".to_string();

        repo.save(&upsert(Document::empty(IndexKind::Album), e))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \"albums\": [\n"));
        assert!(content.ends_with("}\n"));
        assert!(content.contains("福山步道"));
        // No temp files left behind
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn album_document_keeps_other_top_level_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("by-album.json");
        fs::write(&path, r#"{"version": 2, "albums": []}"#).unwrap();
        let repo = IndexRepository::new(&path, IndexKind::Album);

        let doc = upsert(repo.load().document, entry("a", &["1"]));
        repo.save(&doc).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(value["albums"][0]["id"], "a");
    }

    #[test]
    fn bare_array_album_index_keeps_other_albums() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("by-album.json");
        fs::write(
            &path,
            r#"[{"id": "old", "title": "Old", "cover": "", "photos": []}]"#,
        )
        .unwrap();
        let repo = IndexRepository::new(&path, IndexKind::Album);

        let loaded = repo.load();
        assert!(!loaded.recovered);
        let doc = upsert(loaded.document, entry("new", &["1"]));
        repo.save(&doc).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let ids: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["old", "new"]);
    }

    #[cfg(unix)]
    #[test]
    fn saved_index_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("by-date.json");
        let repo = IndexRepository::new(&path, IndexKind::Date);

        repo.save(&Document::empty(IndexKind::Date)).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o644, 0o644);
    }
}
