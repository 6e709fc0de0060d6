//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image` crate (pure Rust decoders) |
//! | Identify | `image::image_dimensions` (header only) |
//! | Flatten alpha | [`flatten_onto_white`] |
//! | Resize | [`resize_to_width`], `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Capture date | `kamadak-exif` (`DateTimeOriginal`, then `DateTime`) |

use super::backend::{BackendError, Dimensions, ImageBackend, ImageMetadata};
use super::calculations::calculate_width_fit;
use super::params::ThumbnailParams;
use chrono::NaiveDate;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use std::path::Path;

/// Extensions the scanner picks up. All have decoders compiled in.
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Composite an image onto a white background and drop the alpha channel.
///
/// Transparent pixels come out white rather than the black a plain RGB
/// conversion would produce. Images without alpha are converted as-is.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Resize to a target width, preserving aspect ratio, never upscaling.
///
/// Height is `round(target_width * H / W)`; see
/// [`calculate_width_fit`](super::calculate_width_fit).
pub fn resize_to_width(img: &DynamicImage, target_width: u32) -> DynamicImage {
    let original = (img.width(), img.height());
    let (width, height) = calculate_width_fit(original, target_width);
    if (width, height) == original {
        return img.clone();
    }
    img.resize_exact(width, height, FilterType::Lanczos3)
}

/// Encode and save as JPEG.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

/// Read the EXIF capture date, preferring `DateTimeOriginal` over `DateTime`.
///
/// Files without EXIF (or with an unparseable timestamp) yield `None`.
fn read_exif_date(path: &Path) -> Option<NaiveDate> {
    let file = std::fs::File::open(path).ok()?;
    let mut reader = std::io::BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;

    [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .iter()
        .find_map(|&tag| {
            let field = exif.get_field(tag, exif::In::PRIMARY)?;
            let exif::Value::Ascii(ref parts) = field.value else {
                return None;
            };
            let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
            NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)
        })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError> {
        Ok(ImageMetadata {
            capture_date: read_exif_date(path),
        })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;

        // Flatten before resampling so transparent edges blend against white
        let flat = DynamicImage::ImageRgb8(flatten_onto_white(&img));

        let resized = if (flat.width(), flat.height()) == (params.width, params.height) {
            flat
        } else {
            flat.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        save_jpeg(&resized, &params.output, params.quality.value())
    }
}
