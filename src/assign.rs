//! Category assignment: place photos into per-category directories.
//!
//! For every `(filename, category)` in a [`Mapping`], the file at
//! `<src>/<filename>` is placed at `<dst>/<category>/<filename>` using one
//! [`PlacementAction`]:
//!
//! | Action | Effect | Source afterwards |
//! |---|---|---|
//! | `copy` | Byte copy, access and modification times preserved | untouched |
//! | `move` | Rename, or copy then delete across filesystems | gone |
//! | `symlink` | Link to the source's absolute, resolved path | untouched |
//!
//! Re-running is safe: copies overwrite, symlinks replace whatever is at the
//! destination. Symlinks point at absolute paths and break if the source
//! tree is moved later.
//!
//! A missing source or a failed placement is logged and recorded in the
//! [`AssignReport`]; the batch carries on. A source directory that does not
//! exist, or a destination category directory that cannot be created,
//! stops the run.

use crate::mapping::{Assignment, Mapping};
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssignError {
    #[error("Invalid action '{0}' (expected copy, move or symlink)")]
    InvalidAction(String),
    #[error("Source directory not found: {0}")]
    MissingSource(PathBuf),
    #[error("Failed to create category directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
}

/// How a file gets into its category directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlacementAction {
    #[default]
    Copy,
    Move,
    Symlink,
}

impl PlacementAction {
    /// Progressive verb for log lines ("Copying a.jpg to trip/").
    pub fn verb(self) -> &'static str {
        match self {
            PlacementAction::Copy => "Copying",
            PlacementAction::Move => "Moving",
            PlacementAction::Symlink => "Symlinking",
        }
    }
}

impl FromStr for PlacementAction {
    type Err = AssignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(PlacementAction::Copy),
            "move" => Ok(PlacementAction::Move),
            "symlink" => Ok(PlacementAction::Symlink),
            _ => Err(AssignError::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for PlacementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlacementAction::Copy => "copy",
            PlacementAction::Move => "move",
            PlacementAction::Symlink => "symlink",
        };
        f.write_str(name)
    }
}

/// A placement that was attempted and failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPlacement {
    pub assignment: Assignment,
    pub reason: String,
}

/// Outcome of an [`assign`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignReport {
    pub action: PlacementAction,
    pub placed: Vec<Assignment>,
    /// Assignments whose source file did not exist.
    pub missing: Vec<Assignment>,
    pub failed: Vec<FailedPlacement>,
}

impl AssignReport {
    fn new(action: PlacementAction) -> Self {
        Self {
            action,
            placed: Vec::new(),
            missing: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Place every assigned file into `dest_dir/<category>/`.
pub fn assign(
    mapping: &Mapping,
    source_dir: &Path,
    dest_dir: &Path,
    action: PlacementAction,
) -> Result<AssignReport, AssignError> {
    if !source_dir.is_dir() {
        return Err(AssignError::MissingSource(source_dir.to_path_buf()));
    }
    let mut report = AssignReport::new(action);

    for assignment in mapping.assignments() {
        let source = source_dir.join(&assignment.filename);
        if !source.exists() {
            log::warn!("Source file not found: {}", source.display());
            report.missing.push(assignment.clone());
            continue;
        }

        let category_dir = dest_dir.join(&assignment.category);
        fs::create_dir_all(&category_dir).map_err(|source| AssignError::CreateDir {
            path: category_dir.clone(),
            source,
        })?;

        let name = Path::new(&assignment.filename)
            .file_name()
            .unwrap_or(OsStr::new(&assignment.filename));
        let destination = category_dir.join(name);

        log::info!(
            "{} {} to {}/",
            action.verb(),
            assignment.filename,
            assignment.category
        );
        match place(&source, &destination, action) {
            Ok(()) => report.placed.push(assignment.clone()),
            Err(e) => {
                log::warn!("Failed to {} {}: {}", action, assignment.filename, e);
                report.failed.push(FailedPlacement {
                    assignment: assignment.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Place a single file. The destination's parent directory must exist.
pub fn place(source: &Path, destination: &Path, action: PlacementAction) -> io::Result<()> {
    match action {
        PlacementAction::Copy => {
            remove_symlink(destination)?;
            if same_file(source, destination) {
                return Ok(());
            }
            copy_preserving_times(source, destination)
        }
        PlacementAction::Move => {
            remove_symlink(destination)?;
            if same_file(source, destination) {
                return Ok(());
            }
            if fs::rename(source, destination).is_err() {
                copy_preserving_times(source, destination)?;
                fs::remove_file(source)?;
            }
            Ok(())
        }
        PlacementAction::Symlink => {
            let target = fs::canonicalize(source)?;
            if destination.symlink_metadata().is_ok() {
                fs::remove_file(destination)?;
            }
            symlink_file(&target, destination)
        }
    }
}

/// True when both paths resolve to the same existing file.
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copying through a symlink left by an earlier run would write into the
/// link's target, so drop the link itself first.
fn remove_symlink(path: &Path) -> io::Result<()> {
    match path.symlink_metadata() {
        Ok(meta) if meta.file_type().is_symlink() => fs::remove_file(path),
        _ => Ok(()),
    }
}

/// Copy into a temp file next to `destination`, then rename it over
/// whatever is there. A read-only copy from an earlier run is replaced
/// instead of opened for writing.
pub(crate) fn copy_preserving_times(source: &Path, destination: &Path) -> io::Result<()> {
    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let staged = NamedTempFile::new_in(dir)?;
    fs::copy(source, staged.path())?;

    let meta = fs::metadata(source)?;
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    // Read-only copies can still have their times set by the owner
    let file = File::options()
        .write(true)
        .open(staged.path())
        .or_else(|_| File::open(staged.path()))?;
    file.set_times(times)?;
    drop(file);

    staged.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink_file(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}
