//! # Gallery Tools
//!
//! Two small photo-gallery utilities behind one binary:
//!
//! - `assign-categories` places photos into category or album directories
//!   according to a YAML or CSV mapping file (copy, move or symlink).
//! - `generate-thumbnails` scans a directory of photos, writes thumbnails
//!   and copies of the originals, and upserts one entry into a JSON index
//!   keyed by album, category or date bucket.
//!
//! # Architecture
//!
//! ```text
//! assign-categories:    mapping.yaml|csv → Mapping → assign() → dst/<category>/
//! generate-thumbnails:  src/ → scan → thumbnails + IndexEntry → upsert → by-*.json
//! ```
//!
//! The index builder is the core. Building an entry is a function of the
//! source directory and the request; merging it into the persisted document
//! is a pure [`index::upsert`]; only [`index::IndexRepository`] reads and
//! writes the JSON file. Rerunning with the same inputs produces a
//! byte-identical index, and entries for other ids are never touched.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`mapping`] | YAML/CSV mapping files normalized into a sorted list of assignments |
//! | [`assign`] | Places mapped files by copy, move or symlink |
//! | [`scan`] | Lists supported image files in a source directory |
//! | [`builder`] | Builds one index entry: thumbnails, copies, titles, dates |
//! | [`index`] | Index document shapes, pure upsert, atomic load/save |
//! | [`types`] | Serialized index records (`IndexEntry`, `PhotoEntry`) |
//! | [`metadata`] | Date extraction (EXIF, filename, directory, mtime) and titles |
//! | [`naming`] | `humanize` and `slugify` helpers |
//! | [`imaging`] | Pure-Rust thumbnail generation behind a swappable backend |
//! | [`config`] | `gallery.toml` loading, merging over stock defaults, validation |
//! | [`output`] | End-of-run summaries printed by the CLI |
//!
//! # Errors
//!
//! Each module owns a `thiserror` enum. Configuration-class failures (bad
//! flags, unreadable mapping, missing source directory, unwritable index)
//! abort the run. Per-file problems (a missing source, a corrupt image) are
//! logged as warnings and reported in the summary; the batch continues.

pub mod assign;
pub mod builder;
pub mod config;
pub mod imaging;
pub mod index;
pub mod mapping;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
