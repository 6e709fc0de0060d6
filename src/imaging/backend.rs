//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the index builder
//! needs: identify, read_metadata, and thumbnail.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate for pixels and `kamadak-exif` for capture dates.

use super::params::ThumbnailParams;
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Embedded image metadata extracted from EXIF.
///
/// - `capture_date`: EXIF `DateTimeOriginal`, falling back to `DateTime`.
///   Only the calendar date is kept; the index stores `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub capture_date: Option<NaiveDate>,
}

/// Trait for image processing backends.
///
/// The builder only talks to this trait, so tests can run the whole
/// scan → thumbnail → index flow against a recording mock.
pub trait ImageBackend {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read embedded EXIF metadata (capture date).
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError>;

    /// Decode, flatten onto white, resize and write a JPEG thumbnail.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
