//! Plans and executes the placement of media files in the new storage layout.
//!
//! Primary files land at `<target>/<media_id>`, thumbnails at
//! `<target>/thumbs/<media_id>`.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::associate::MaterializationEntry;
use crate::error::{Error, Result};

/// Subdirectory of the target root holding thumbnails.
pub const THUMBS_DIR: &str = "thumbs";

/// How planned files reach the target root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStrategy {
    /// Symbolic link from destination to source.
    Link,
    /// Byte copy.
    Copy,
    /// Plan only.
    #[default]
    None,
}

impl FileStrategy {
    /// Resolves the strategy from the two CLI switches.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if both switches are set.
    pub fn from_flags(link: bool, copy: bool) -> Result<Self> {
        match (link, copy) {
            (true, true) => Err(Error::Config(
                "Cannot use both --link-files and --copy-files".to_string(),
            )),
            (true, false) => Ok(Self::Link),
            (false, true) => Ok(Self::Copy),
            (false, false) => Ok(Self::None),
        }
    }
}

/// Role of a file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// The media file itself.
    Primary,
    /// Its thumbnail.
    Thumbnail,
}

/// One planned placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOperation {
    /// Existing file in the legacy tree.
    pub source: PathBuf,
    /// Location in the new tree.
    pub destination: PathBuf,
    /// Primary or thumbnail.
    pub kind: FileKind,
}

/// Counters of an execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    /// Links created.
    pub linked: u64,
    /// Files copied.
    pub copied: u64,
    /// Existing destinations replaced.
    pub replaced: u64,
}

/// Computes one operation per primary file and one per thumbnail.
#[must_use]
pub fn plan(
    entries: &[MaterializationEntry],
    source_root: &Path,
    target_root: &Path,
) -> Vec<FileOperation> {
    let mut ops = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        ops.push(FileOperation {
            source: source_root.join(&entry.primary),
            destination: target_root.join(&entry.media_id),
            kind: FileKind::Primary,
        });
        if let Some(thumb) = &entry.thumbnail {
            ops.push(FileOperation {
                source: source_root.join(thumb),
                destination: target_root.join(THUMBS_DIR).join(&entry.media_id),
                kind: FileKind::Thumbnail,
            });
        }
    }
    ops
}

/// Applies `ops` with `strategy`.
///
/// Each source is checked again right before it is used, even if the
/// existence check was skipped while building.
///
/// # Errors
///
/// Returns [`Error::SourceVanished`] if a source no longer exists, or an IO
/// error if the destination cannot be written.
pub fn execute(ops: &[FileOperation], strategy: FileStrategy) -> Result<MaterializeStats> {
    let mut stats = MaterializeStats::default();
    if strategy == FileStrategy::None {
        info!("File strategy is none, {} operations planned only", ops.len());
        return Ok(stats);
    }

    let progress = create_progress_bar(ops.len() as u64);
    for op in ops {
        if !op.source.exists() {
            return Err(Error::SourceVanished(op.source.clone()));
        }
        if let Some(parent) = op.destination.parent() {
            fs::create_dir_all(parent)?;
        }
        if fs::symlink_metadata(&op.destination).is_ok() {
            debug!("Replacing existing {}", op.destination.display());
            fs::remove_file(&op.destination)?;
            stats.replaced += 1;
        }

        match strategy {
            FileStrategy::Link => {
                let source = fs::canonicalize(&op.source).map_err(|e| match e.kind() {
                    io::ErrorKind::NotFound => Error::SourceVanished(op.source.clone()),
                    _ => Error::Io(e),
                })?;
                symlink(&source, &op.destination)?;
                stats.linked += 1;
                info!("Linked {} to {}", source.display(), op.destination.display());
            }
            FileStrategy::Copy => {
                fs::copy(&op.source, &op.destination)?;
                stats.copied += 1;
                info!("Copied {} to {}", op.source.display(), op.destination.display());
            }
            FileStrategy::None => {}
        }
        progress.inc(1);
    }
    progress.finish_with_message("Files materialized");

    Ok(stats)
}

#[cfg(unix)]
fn symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(windows)]
fn symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, destination)
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
#[path = "materialize_tests.rs"]
mod tests;
