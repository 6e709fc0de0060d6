//! Photo metadata extraction and resolution.
//!
//! Every [`PhotoEntry`](crate::types::PhotoEntry) carries a title and an
//! optional date. Both are derived here, independently of image decoding.
//!
//! ## Dates
//!
//! A photo's date can come from four places. The first one that yields a
//! real calendar date wins:
//!
//! 1. **EXIF** capture time (`DateTimeOriginal`, then `DateTime`), read by
//!    the imaging backend and passed in.
//! 2. **Filename**: a maximal run of digits. An 8-digit `YYYYMMDD` run is
//!    preferred over a 6-digit `YYMMDD` run (read as `20YY`). A run whose
//!    month or day is out of range is rejected, and the search moves on.
//! 3. **Directory layout**: `.../2025/01-15/photo.jpg`.
//! 4. **Modification time** of the file, unless disabled in config.
//!
//! No date is ever invented. If nothing matches, the photo has no date.
//!
//! ## Titles
//!
//! Titles come from the filename, in one of three [`TitleStyle`]s. The
//! humanized style falls back to the raw stem, then the full filename, when
//! the stem is all separators.

use crate::naming::humanize;
use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value.
///
/// ```text
/// title: resolve(&[humanized_stem, raw_stem, filename])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

// =============================================================================
// Dates
// =============================================================================

/// Where a resolved date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Exif,
    Filename,
    Directory,
    Modified,
}

/// Switches for the date priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateOptions {
    /// Fall back to the file's modification time when nothing else matches.
    pub mtime_fallback: bool,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            mtime_fallback: true,
        }
    }
}

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit-run pattern must compile"));

/// Resolve a photo's date from all sources, in priority order.
///
/// `exif_date` is whatever the backend found in the file (if anything).
pub fn extract_date(
    path: &Path,
    exif_date: Option<NaiveDate>,
    options: &DateOptions,
) -> Option<(NaiveDate, DateSource)> {
    let filename = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    exif_date
        .map(|d| (d, DateSource::Exif))
        .or_else(|| date_from_filename(&filename).map(|d| (d, DateSource::Filename)))
        .or_else(|| date_from_directory(path).map(|d| (d, DateSource::Directory)))
        .or_else(|| {
            options
                .mtime_fallback
                .then(|| date_from_modified(path))
                .flatten()
                .map(|d| (d, DateSource::Modified))
        })
}

/// Find a date embedded in a filename.
///
/// All 8-digit runs are tried first, in order, then all 6-digit runs.
/// Runs of any other length never match, so `IMG_20250101123456` (14 digits)
/// is not mistaken for a date.
pub fn date_from_filename(name: &str) -> Option<NaiveDate> {
    let runs: Vec<&str> = DIGIT_RUN.find_iter(name).map(|m| m.as_str()).collect();

    let eight = runs.iter().filter(|r| r.len() == 8).find_map(|r| {
        let year: i32 = r[0..4].parse().ok()?;
        calendar_date(year, &r[4..6], &r[6..8])
    });

    eight.or_else(|| {
        runs.iter().filter(|r| r.len() == 6).find_map(|r| {
            let yy: i32 = r[0..2].parse().ok()?;
            calendar_date(2000 + yy, &r[2..4], &r[4..6])
        })
    })
}

/// Find a date encoded as `YYYY/MM-DD/` in the file's parent directories.
pub fn date_from_directory(path: &Path) -> Option<NaiveDate> {
    let day_dir = path.parent()?;
    let year_dir = day_dir.parent()?;

    let year_name = year_dir.file_name()?.to_str()?;
    if year_name.len() != 4 || !year_name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_name.parse().ok()?;

    let (month, day) = day_dir.file_name()?.to_str()?.split_once('-')?;
    let is_short_number = |s: &str| (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
    if !is_short_number(month) || !is_short_number(day) {
        return None;
    }

    calendar_date(year, month, day)
}

/// The file's last modification time as a local calendar date.
pub fn date_from_modified(path: &Path) -> Option<NaiveDate> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).date_naive())
}

/// Build a date from month/day digit strings.
///
/// Month must be 1-12 and day 1-31, and the result must exist on the
/// calendar (so `0230` is rejected as well as `1301`).
fn calendar_date(year: i32, month: &str, day: &str) -> Option<NaiveDate> {
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

// =============================================================================
// Titles
// =============================================================================

/// How photo titles are derived from filenames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleStyle {
    /// `sunset_at-sea.jpg` → "Sunset At Sea"
    #[default]
    Humanized,
    /// `sunset_at-sea.jpg` → "sunset_at-sea"
    Stem,
    /// `sunset_at-sea.jpg` → "sunset_at-sea.jpg"
    Filename,
}

/// Derive a photo title from its filename.
pub fn photo_title(filename: &str, style: TitleStyle) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let resolved = match style {
        TitleStyle::Humanized => {
            let humanized = humanize(&stem);
            resolve(&[Some(&humanized), Some(&stem), Some(filename)])
        }
        TitleStyle::Stem => resolve(&[Some(&stem), Some(filename)]),
        TitleStyle::Filename => resolve(&[Some(filename)]),
    };
    resolved.unwrap_or_else(|| filename.to_string())
}
