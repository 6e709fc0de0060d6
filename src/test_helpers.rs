//! Shared test utilities for the gallery-tools test suite.
//!
//! Writes real, decodable images so backend tests exercise the `image` and
//! `kamadak-exif` crates end to end, and provides lookups that panic with a
//! clear message on a miss.
//!
//! # Usage
//!
//! ```text
//! use crate::test_helpers::*;
//!
//! write_test_image(&src.join("wide.jpg"), 1200, 800);
//! write_test_jpeg_with_exif_date(&src.join("camera.jpg"), 64, 48, "2024:03:15 10:20:30");
//!
//! let photo = find_photo(&entry, "camera.jpg");
//! assert_eq!(photo.date, NaiveDate::from_ymd_opt(2024, 3, 15));
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

use crate::types::{IndexEntry, PhotoEntry};

// =========================================================================
// Image fixtures
// =========================================================================

/// A gradient so resampling has something to chew on.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a synthetic image; the format follows the file extension.
pub fn write_test_image(path: &Path, width: u32, height: u32) {
    gradient(width, height).save(path).unwrap();
}

/// Write a JPEG carrying an EXIF `DateTime` tag (`"YYYY:MM:DD HH:MM:SS"`).
///
/// The APP1 segment holds a minimal little-endian TIFF with a single IFD0
/// entry, spliced in right after the SOI marker.
pub fn write_test_jpeg_with_exif_date(path: &Path, width: u32, height: u32, datetime: &str) {
    assert_eq!(datetime.len(), 19, "EXIF DateTime must be 19 characters");

    let mut jpeg = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "encoder must start with SOI");

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset
    tiff.extend_from_slice(&1u16.to_le_bytes()); // entry count
    tiff.extend_from_slice(&0x0132u16.to_le_bytes()); // DateTime
    tiff.extend_from_slice(&2u16.to_le_bytes()); // ASCII
    tiff.extend_from_slice(&20u32.to_le_bytes()); // 19 chars + NUL
    tiff.extend_from_slice(&26u32.to_le_bytes()); // value offset
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
    tiff.extend_from_slice(datetime.as_bytes());
    tiff.push(0);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = (payload.len() + 2) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);

    std::fs::write(path, out).unwrap();
}

// =========================================================================
// Index lookups: panics with a clear message on miss
// =========================================================================

/// Find a photo by filename within an entry. Panics if not found.
pub fn find_photo<'a>(entry: &'a IndexEntry, filename: &str) -> &'a PhotoEntry {
    entry
        .photos
        .iter()
        .find(|p| p.filename == filename)
        .unwrap_or_else(|| {
            let names: Vec<&str> = entry.photos.iter().map(|p| p.filename.as_str()).collect();
            panic!(
                "photo '{filename}' not found in '{}'. Available: {names:?}",
                entry.id
            )
        })
}
