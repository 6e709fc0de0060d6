//! Thumbnail planning and execution.
//!
//! [`plan_thumbnail`] turns a source size and a [`ThumbnailConfig`] into
//! [`ThumbnailParams`] without touching pixels; [`create_thumbnail`] runs
//! the plan on a backend and reports the size it produced.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_width_fit;
use super::params::{Quality, ThumbnailParams};
use std::path::Path;

/// Operations fail with the backend's error.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Width and height of the image at `path`.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Width target and JPEG quality for thumbnails.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Target width in pixels; narrower sources keep their size.
    pub width: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 400,
            quality: Quality::default(),
        }
    }
}

/// A thumbnail written by [`create_thumbnail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedThumbnail {
    /// File name inside the output directory, always `<stem>.jpg`.
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// Thumbnail file name for a source stem. Every thumbnail is a JPEG.
pub fn thumbnail_filename(filename_stem: &str) -> String {
    format!("{}.jpg", filename_stem)
}

/// Plan a thumbnail operation without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_thumbnail(
    source: &Path,
    output_path: &Path,
    original_dims: (u32, u32),
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    let (width, height) = calculate_width_fit(original_dims, config.width);

    ThumbnailParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        width,
        height,
        quality: config.quality,
    }
}

/// Create a thumbnail image.
///
/// Identifies the source, fits it to the configured width and asks the
/// backend to write `<output_dir>/<stem>.jpg`.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    filename_stem: &str,
    config: &ThumbnailConfig,
) -> Result<GeneratedThumbnail> {
    let original_dims = get_dimensions(backend, source)?;
    let filename = thumbnail_filename(filename_stem);
    let thumb_path = output_dir.join(&filename);

    let params = plan_thumbnail(source, &thumb_path, original_dims, config);
    backend.thumbnail(&params)?;

    Ok(GeneratedThumbnail {
        filename,
        width: params.width,
        height: params.height,
    })
}
