//! Tool configuration.
//!
//! Handles loading, validating, and merging `gallery.toml`. Stock defaults
//! are the base layer; a user file overrides any subset of keys; command
//! line flags override both.
//!
//! ## Config File Location
//!
//! - `--config <path>`: that file, which must exist.
//! - otherwise `./gallery.toml` when present.
//! - otherwise stock defaults only.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnails]
//! width = 400               # Thumbnail width in pixels (never upscaled)
//! quality = 85              # JPEG quality (1-100)
//!
//! [index]
//! dir = "data/photos"       # Holds by-album.json, by-category.json, by-date.json
//!
//! [dates]
//! mtime_fallback = true     # Use file modification time when nothing else dates a photo
//!
//! [titles]
//! style = "humanized"       # humanized | stem | filename
//!
//! [assign]
//! action = "copy"           # copy | move | symlink
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::assign::{AssignError, PlacementAction};
use crate::imaging::{Quality, ThumbnailConfig};
use crate::metadata::{DateOptions, TitleStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "gallery.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config validation error: assign.action: {0}")]
    InvalidAction(#[from] AssignError),
}

/// Tool configuration loaded from `gallery.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub thumbnails: ThumbnailsConfig,
    pub index: IndexConfig,
    pub dates: DatesConfig,
    pub titles: TitlesConfig,
    pub assign: AssignConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.width == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.width must be greater than 0".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.index.dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "index.dir must not be empty".into(),
            ));
        }
        self.assign_action()?;
        Ok(())
    }

    /// Thumbnail settings, optionally with a width override from the CLI.
    pub fn thumbnail_config(&self, width_override: Option<u32>) -> ThumbnailConfig {
        ThumbnailConfig {
            width: width_override.unwrap_or(self.thumbnails.width),
            quality: Quality::new(self.thumbnails.quality),
        }
    }

    pub fn assign_action(&self) -> Result<PlacementAction, AssignError> {
        self.assign.action.parse()
    }

    pub fn date_options(&self) -> DateOptions {
        DateOptions {
            mtime_fallback: self.dates.mtime_fallback,
        }
    }

    pub fn index_dir(&self) -> PathBuf {
        PathBuf::from(&self.index.dir)
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Target width in pixels. Narrower images keep their size.
    pub width: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            width: 400,
            quality: 85,
        }
    }
}

/// Where index documents live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    pub dir: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: "data/photos".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatesConfig {
    pub mtime_fallback: bool,
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            mtime_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TitlesConfig {
    pub style: TitleStyle,
}

/// Category assignment settings.
///
/// The action is kept as text here and parsed in [`ToolConfig::validate`],
/// so a typo is reported the same way as a bad `--action` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssignConfig {
    pub action: String,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            action: PlacementAction::default().to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Pick the config file to read.
///
/// An explicit path must exist. Without one, `gallery.toml` in `cwd` is
/// used if present.
pub fn find_config(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>, ConfigError> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(ConfigError::NotFound(path.to_path_buf())),
        None => {
            let candidate = cwd.join(DEFAULT_CONFIG_FILE);
            Ok(candidate.is_file().then_some(candidate))
        }
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a run started in `cwd`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<ToolConfig, ConfigError> {
    let overlay = match find_config(explicit, cwd)? {
        Some(path) => {
            log::debug!("Loading config from {}", path.display());
            Some(load_raw_config(&path)?)
        }
        None => None,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `gallery.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gallery-tools configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Read from ./gallery.toml, or from the file given with --config.
# Command line flags override these values.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Thumbnails (generate-thumbnails)
# ---------------------------------------------------------------------------
[thumbnails]
# Width in pixels. Height follows the aspect ratio.
# Images narrower than this keep their original size.
width = 400

# JPEG encoding quality (1 = worst, 100 = best).
quality = 85

# ---------------------------------------------------------------------------
# Index documents (generate-thumbnails)
# ---------------------------------------------------------------------------
[index]
# Directory holding by-album.json, by-category.json and by-date.json.
# --index overrides the full path for one run.
dir = "data/photos"

# ---------------------------------------------------------------------------
# Photo dates
# ---------------------------------------------------------------------------
[dates]
# Dates come from EXIF, then the filename (YYYYMMDD or YYMMDD),
# then a YYYY/MM-DD/ directory layout. When none of those match,
# fall back to the file's modification time.
mtime_fallback = true

# ---------------------------------------------------------------------------
# Photo titles
# ---------------------------------------------------------------------------
[titles]
# humanized: "sunset_at-sea.jpg" -> "Sunset At Sea"
# stem:      "sunset_at-sea.jpg" -> "sunset_at-sea"
# filename:  "sunset_at-sea.jpg" -> "sunset_at-sea.jpg"
style = "humanized"

# ---------------------------------------------------------------------------
# Category assignment (assign-categories)
# ---------------------------------------------------------------------------
[assign]
# copy | move | symlink. --action overrides this.
action = "copy"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ToolConfig::default();
        assert_eq!(config.thumbnails.width, 400);
        assert_eq!(config.thumbnails.quality, 85);
        assert_eq!(config.index.dir, "data/photos");
        assert!(config.dates.mtime_fallback);
        assert_eq!(config.titles.style, TitleStyle::Humanized);
        assert_eq!(config.assign_action().unwrap(), PlacementAction::Copy);
    }

    #[test]
    fn parse_partial_config() {
        let config: ToolConfig = toml::from_str(
            r#"
[thumbnails]
width = 320
"#,
        )
        .unwrap();
        assert_eq!(config.thumbnails.width, 320);
        assert_eq!(config.thumbnails.quality, 85);
        assert_eq!(config.index.dir, "data/photos");
    }

    #[test]
    fn thumbnail_config_applies_cli_override() {
        let config = ToolConfig::default();
        assert_eq!(config.thumbnail_config(None).width, 400);
        assert_eq!(config.thumbnail_config(Some(200)).width, 200);
        assert_eq!(config.thumbnail_config(None).quality.value(), 85);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"width = 400"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"width = 300"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("width").unwrap().as_integer(), Some(300));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str(
            r#"
[thumbnails]
quality = 70
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let thumbnails = merged.get("thumbnails").unwrap();
        assert_eq!(thumbnails.get("quality").unwrap().as_integer(), Some(70));
        // width preserved from base
        assert_eq!(thumbnails.get("width").unwrap().as_integer(), Some(400));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<ToolConfig, _> = toml::from_str(
            r#"
[thumbnails]
widht = 300
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<ToolConfig, _> = toml::from_str("[images]\nquality = 90\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(ToolConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_zero_width() {
        let mut config = ToolConfig::default();
        config.thumbnails.width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = ToolConfig::default();
        config.thumbnails.quality = 100;
        assert!(config.validate().is_ok());
        config.thumbnails.quality = 0;
        assert!(config.validate().is_err());
        config.thumbnails.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_empty_index_dir() {
        let mut config = ToolConfig::default();
        config.index.dir = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_unknown_action() {
        let mut config = ToolConfig::default();
        config.assign.action = "teleport".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAction(AssignError::InvalidAction(_)))
        ));
    }

    #[test]
    fn unknown_title_style_rejected() {
        let overlay: toml::Value = toml::from_str("[titles]\nstyle = \"fancy\"\n").unwrap();
        assert!(resolve_config(stock_defaults_value(), Some(overlay)).is_err());
    }

    // =========================================================================
    // Loading tests
    // =========================================================================

    #[test]
    fn load_config_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn load_config_reads_gallery_toml_from_cwd() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("gallery.toml"),
            "[assign]\naction = \"symlink\"\n[titles]\nstyle = \"stem\"\n",
        )
        .unwrap();

        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.assign_action().unwrap(), PlacementAction::Symlink);
        assert_eq!(config.titles.style, TitleStyle::Stem);
        assert_eq!(config.thumbnails.width, 400);
    }

    #[test]
    fn load_config_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[index]\ndir = \"site/data\"\n").unwrap();

        let config = load_config(Some(&path), Path::new("/nonexistent")).unwrap();
        assert_eq!(config.index_dir(), PathBuf::from("site/data"));
    }

    #[test]
    fn load_config_explicit_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")), tmp.path());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("gallery.toml"), "[thumbnails\n").unwrap();
        assert!(matches!(
            load_config(None, tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ToolConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[thumbnails]", "[index]", "[dates]", "[titles]", "[assign]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        for key in ["thumbnails", "index", "dates", "titles", "assign"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }
}
