//! Index builder: scan → thumbnail → copy → metadata → JSON upsert.
//!
//! One run builds one [`IndexEntry`] (an album, a category or a date bucket)
//! from the images directly inside a source directory, then merges it into
//! the persisted index document.
//!
//! ## Output layout
//!
//! ```text
//! <dst>/
//! ├── albums/<id>/photo_20250101_1.jpg            # copy of the original (unless --no-copy)
//! └── thumbnails/albums/<id>/photo_20250101_1.jpg # width-fit JPEG thumbnail
//! ```
//!
//! `albums` is the section for album mode; categories use `categories` and
//! date buckets use `dates`.
//!
//! ## References in the index
//!
//! `path` and `thumbnail` are written as `<prefix>/<section>/<id>/<file>`,
//! where the prefix defaults to `--dst` exactly as it was given, so a
//! relative `--dst` gives repo-relative references. With copying disabled,
//! `path` points at the file inside the source directory instead.
//!
//! ## Failures
//!
//! A file that cannot be identified, thumbnailed or copied is logged and
//! left out of the entry; the rest of the batch carries on. A missing source
//! directory, an output directory that cannot be created, or an index that
//! cannot be written fails the whole run.

use crate::assign::{copy_preserving_times, same_file};
use crate::imaging::{ImageBackend, RustBackend, ThumbnailConfig, create_thumbnail};
use crate::index::{IndexError, IndexKind, IndexRepository, upsert};
use crate::metadata::{DateOptions, TitleStyle, extract_date, photo_title};
use crate::naming::{humanize, slugify};
use crate::scan::{ScanError, list_images};
use crate::types::{IndexEntry, PhotoEntry};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{0}")]
    Scan(#[from] ScanError),
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Which entry a run builds: kind, id and display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub kind: IndexKind,
    pub id: String,
    pub title: String,
}

impl IndexTarget {
    /// Resolve the identifier flags for a mode.
    ///
    /// - album: `album_id` is the id as given; the title is `album_title`
    ///   or the humanized id.
    /// - category: the id is the slug of `category`; the title is the name
    ///   as given.
    /// - date: `date` is both id and title.
    ///
    /// Exactly the identifier that matches the mode must be present, and
    /// `album_title` is only accepted in album mode.
    pub fn resolve(
        kind: IndexKind,
        album_id: Option<&str>,
        category: Option<&str>,
        date: Option<&str>,
        album_title: Option<&str>,
    ) -> Result<Self, BuildError> {
        let given = |flag: &str, value: Option<&str>| value.map(|_| flag.to_string());
        let stray: Vec<String> = match kind {
            IndexKind::Album => [given("--category", category), given("--date", date)]
                .into_iter()
                .flatten()
                .collect(),
            IndexKind::Category => [
                given("--album-id", album_id),
                given("--date", date),
                given("--album-title", album_title),
            ]
            .into_iter()
            .flatten()
            .collect(),
            IndexKind::Date => [
                given("--album-id", album_id),
                given("--category", category),
                given("--album-title", album_title),
            ]
            .into_iter()
            .flatten()
            .collect(),
        };
        if !stray.is_empty() {
            return Err(BuildError::InvalidTarget(format!(
                "{} not allowed in {} mode",
                stray.join(", "),
                kind.label()
            )));
        }

        let required = |flag: &str, value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .ok_or_else(|| {
                    BuildError::InvalidTarget(format!("{} mode requires {flag}", kind.label()))
                })
        };

        let target = match kind {
            IndexKind::Album => {
                let id = required("--album-id", album_id)?;
                let title = album_title
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .unwrap_or_else(|| default_title(&id));
                IndexTarget { kind, id, title }
            }
            IndexKind::Category => {
                let name = required("--category", category)?;
                let id = slugify(&name);
                if id.is_empty() {
                    return Err(BuildError::InvalidTarget(format!(
                        "category '{name}' has no usable characters for an id"
                    )));
                }
                IndexTarget {
                    kind,
                    id,
                    title: name,
                }
            }
            IndexKind::Date => {
                let id = required("--date", date)?;
                IndexTarget {
                    kind,
                    title: id.clone(),
                    id,
                }
            }
        };

        if !is_path_segment(&target.id) {
            return Err(BuildError::InvalidTarget(format!(
                "'{}' cannot be used as a directory name",
                target.id
            )));
        }
        Ok(target)
    }
}

fn default_title(id: &str) -> String {
    let title = humanize(id);
    if title.is_empty() { id.to_string() } else { title }
}

/// The id becomes a directory under the destination, so it must be a single
/// plain path segment.
fn is_path_segment(id: &str) -> bool {
    id != "." && id != ".." && !id.contains(['/', '\\'])
}

/// Everything one build run needs.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub source_dir: PathBuf,
    pub dest_base: PathBuf,
    pub target: IndexTarget,
    pub thumbnail: ThumbnailConfig,
    /// Prefix for `path` and `thumbnail` references; `None` uses `dest_base`.
    pub url_prefix: Option<String>,
    /// Copy originals under `dest_base`. When false, `path` points into `source_dir`.
    pub copy_originals: bool,
    pub dates: DateOptions,
    pub title_style: TitleStyle,
}

impl BuildRequest {
    fn prefix(&self) -> String {
        match &self.url_prefix {
            Some(prefix) => normalize_prefix(prefix),
            None => normalize_prefix(&self.dest_base.to_string_lossy()),
        }
    }
}

/// A source file left out of the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPhoto {
    pub filename: String,
    pub reason: String,
}

/// Outcome of a build run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub entry: IndexEntry,
    pub kind: IndexKind,
    pub skipped: Vec<SkippedPhoto>,
    pub index_path: PathBuf,
    /// The previous index was unreadable and was replaced.
    pub recovered: bool,
}

impl BuildReport {
    pub fn processed(&self) -> usize {
        self.entry.photos.len()
    }
}

/// Build one entry and merge it into the index, using the `image` crate.
pub fn build_index(
    request: &BuildRequest,
    repository: &IndexRepository,
) -> Result<BuildReport, BuildError> {
    let backend = RustBackend::new();
    build_index_with_backend(&backend, request, repository)
}

/// Build one entry and merge it into the index (allows testing with mock).
pub fn build_index_with_backend(
    backend: &impl ImageBackend,
    request: &BuildRequest,
    repository: &IndexRepository,
) -> Result<BuildReport, BuildError> {
    let (entry, skipped) = build_entry_with_backend(backend, request)?;

    let loaded = repository.load();
    let document = upsert(loaded.document, entry.clone());
    repository.save(&document)?;
    log::info!(
        "Wrote {} '{}' to {}",
        request.target.kind.label(),
        entry.id,
        repository.path().display()
    );

    Ok(BuildReport {
        entry,
        kind: request.target.kind,
        skipped,
        index_path: repository.path().to_path_buf(),
        recovered: loaded.recovered,
    })
}

/// Generate thumbnails (and copies) and assemble the entry, without
/// touching the index document.
pub fn build_entry_with_backend(
    backend: &impl ImageBackend,
    request: &BuildRequest,
) -> Result<(IndexEntry, Vec<SkippedPhoto>), BuildError> {
    let target = &request.target;
    let section = target.kind.section();
    let sources = list_images(&request.source_dir)?;
    if sources.is_empty() {
        log::warn!("No images found in {}", request.source_dir.display());
    }

    let thumb_dir = request
        .dest_base
        .join("thumbnails")
        .join(section)
        .join(&target.id);
    create_dir(&thumb_dir)?;
    let copy_dir = request.dest_base.join(section).join(&target.id);
    if request.copy_originals {
        create_dir(&copy_dir)?;
    }

    let prefix = request.prefix();
    let source_prefix = normalize_prefix(&request.source_dir.to_string_lossy());

    let mut photos = Vec::new();
    let mut skipped = Vec::new();
    // Thumbnails are always .jpg, so a.png and a.jpg would collide
    let mut thumbnails_by_stem: HashMap<String, String> = HashMap::new();

    for source in &sources {
        let filename = file_name_string(source);
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.clone());

        let mut skip = |reason: String| {
            log::warn!("Skipping {}: {}", filename, reason);
            skipped.push(SkippedPhoto {
                filename: filename.clone(),
                reason,
            });
        };

        if let Some(first) = thumbnails_by_stem.get(&stem) {
            skip(format!("thumbnail name collides with {first}"));
            continue;
        }

        let thumb = match create_thumbnail(
            backend,
            source,
            &thumb_dir,
            &stem,
            &request.thumbnail,
        ) {
            Ok(thumb) => thumb,
            Err(e) => {
                skip(e.to_string());
                continue;
            }
        };
        log::info!(
            "Thumbnail {} ({}x{})",
            thumb.filename,
            thumb.width,
            thumb.height
        );

        let path = if request.copy_originals {
            let destination = copy_dir.join(&filename);
            if same_file(source, &destination) {
                log::debug!("{} is already in place, not copying", filename);
            } else if let Err(e) = copy_preserving_times(source, &destination) {
                // The photo is left out, so its thumbnail goes too
                if let Err(rm) = fs::remove_file(thumb_dir.join(&thumb.filename)) {
                    log::debug!("{}: thumbnail not removed ({})", filename, rm);
                }
                skip(format!("copy failed: {e}"));
                continue;
            }
            join_reference(&prefix, &[section, &target.id, &filename])
        } else {
            join_reference(&source_prefix, &[&filename])
        };

        let exif_date = match backend.read_metadata(source) {
            Ok(metadata) => metadata.capture_date,
            Err(e) => {
                log::debug!("{}: no EXIF metadata ({})", filename, e);
                None
            }
        };
        let date = match extract_date(source, exif_date, &request.dates) {
            Some((date, from)) => {
                log::debug!("{}: date {} from {:?}", filename, date, from);
                Some(date)
            }
            None => {
                log::debug!("{}: no date", filename);
                None
            }
        };

        let thumbnail = join_reference(
            &prefix,
            &["thumbnails", section, &target.id, &thumb.filename],
        );
        thumbnails_by_stem.insert(stem, filename.clone());
        photos.push(PhotoEntry {
            title: photo_title(&filename, request.title_style),
            date,
            path,
            thumbnail,
            filename,
        });
    }

    let entry = IndexEntry::new(target.id.clone(), target.title.clone(), photos);
    Ok((entry, skipped))
}

fn create_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|source| BuildError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Forward slashes, no trailing slash. `./site/` and `site` stay distinct;
/// the prefix is used the way it was written.
fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.replace('\\', "/");
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() && prefix.starts_with('/') {
        // A bare "/" means root-relative references
        return "/".to_string();
    }
    trimmed.to_string()
}

/// Join reference segments onto a prefix with `/`.
fn join_reference(prefix: &str, segments: &[&str]) -> String {
    let tail = segments.join("/");
    match prefix {
        "" => tail,
        "/" => format!("/{tail}"),
        _ => format!("{prefix}/{tail}"),
    }
}
