//! Source directory listing for the index builder.
//!
//! Only files directly inside the source directory are considered:
//!
//! ```text
//! incoming/
//! ├── photo_20250101_1.jpg     # picked up
//! ├── photo_20250102_2.PNG     # picked up (extensions are case-insensitive)
//! ├── .DS_Store                # hidden, skipped
//! ├── notes.txt                # not an image, skipped
//! └── extras/                  # subdirectories are not descended into
//!     └── bonus.jpg
//! ```
//!
//! The result is sorted by filename, which fixes photo order in the index.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Source directory does not exist: {0}")]
    MissingSource(PathBuf),
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// List the image files directly under `dir`, sorted by filename.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.exists() {
        return Err(ScanError::MissingSource(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut images = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        // Symlinked images count; walkdir reports the link's own type
        if !entry.path().is_file() {
            continue;
        }
        if is_image(entry.path()) {
            images.push(entry.into_path());
        }
    }

    Ok(images)
}

fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn lists_images_sorted_by_filename() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.jpg"), "fake").unwrap();
        fs::write(tmp.path().join("a.png"), "fake").unwrap();
        fs::write(tmp.path().join("c.webp"), "fake").unwrap();

        let images = list_images(tmp.path()).unwrap();
        assert_eq!(names(&images), vec!["a.png", "b.jpg", "c.webp"]);
    }

    #[test]
    fn extensions_are_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("DSC_0001.JPG"), "fake").unwrap();
        fs::write(tmp.path().join("scan.Jpeg"), "fake").unwrap();
        fs::write(tmp.path().join("anim.GIF"), "fake").unwrap();

        let images = list_images(tmp.path()).unwrap();
        assert_eq!(images.len(), 3);
    }

    #[test]
    fn skips_hidden_and_non_image_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".hidden.jpg"), "fake").unwrap();
        fs::write(tmp.path().join("notes.txt"), "text").unwrap();
        fs::write(tmp.path().join("raw.cr2"), "raw").unwrap();
        fs::write(tmp.path().join("keep.jpg"), "fake").unwrap();

        let images = list_images(tmp.path()).unwrap();
        assert_eq!(names(&images), vec!["keep.jpg"]);
    }

    #[test]
    fn does_not_descend_into_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("extras");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("bonus.jpg"), "fake").unwrap();
        // A directory with an image-like name is not an image
        fs::create_dir_all(tmp.path().join("folder.jpg")).unwrap();
        fs::write(tmp.path().join("top.jpg"), "fake").unwrap();

        let images = list_images(tmp.path()).unwrap();
        assert_eq!(names(&images), vec!["top.jpg"]);
    }

    #[test]
    fn empty_directory_lists_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(list_images(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = list_images(&tmp.path().join("nope"));
        assert!(matches!(result, Err(ScanError::MissingSource(_))));
    }

    #[test]
    fn file_instead_of_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("photo.jpg");
        fs::write(&file, "fake").unwrap();

        let result = list_images(&file);
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }
}
