//! Image processing: pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Capture date** | `kamadak-exif` |
//! | **Thumbnail** | flatten onto white + Lanczos3 width fit + JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, ImageMetadata};
pub use calculations::calculate_width_fit;
pub use operations::{
    GeneratedThumbnail, ThumbnailConfig, create_thumbnail, get_dimensions, thumbnail_filename,
};
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::{
    RustBackend, flatten_onto_white, resize_to_width, supported_input_extensions,
};
