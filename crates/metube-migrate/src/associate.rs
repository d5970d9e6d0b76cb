//! Links converted variants to the uploads they were encoded from.
//!
//! Converted records are built first so that every media id an upload points
//! at already exists when the upload is built. Reversing the passes would
//! silently drop every link.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::builder::{BuiltVideo, VideoBuilder};
use crate::classify::{Bucket, Buckets};
use crate::documents::{Video, VideoFile};
use crate::error::Result;
use crate::record::{key_field, Fields, LegacyKey};

/// Files to materialize for one media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializationEntry {
    /// Media id, the destination file name.
    pub media_id: String,
    /// Primary media path relative to the legacy base directory.
    pub primary: PathBuf,
    /// Thumbnail path relative to the legacy base directory.
    pub thumbnail: Option<PathBuf>,
}

/// Record counters of an association run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssociationStats {
    /// Converted variants built.
    pub converted_built: u64,
    /// Converted variants dropped.
    pub converted_skipped: u64,
    /// Uploads built.
    pub uploads_built: u64,
    /// Uploads dropped.
    pub uploads_skipped: u64,
    /// Uploads linked to a converted variant.
    pub linked: u64,
}

/// Documents and file entries produced from the video buckets.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Media file descriptors, converted variants first.
    pub video_files: Vec<VideoFile>,
    /// Public videos keyed by legacy code.
    pub videos: BTreeMap<String, Video>,
    /// Files to materialize.
    pub entries: Vec<MaterializationEntry>,
    /// Counters.
    pub stats: AssociationStats,
}

impl Catalog {
    fn push(&mut self, built: BuiltVideo) {
        self.entries.push(MaterializationEntry {
            media_id: built.media_id,
            primary: built.source,
            thumbnail: built.thumbnail,
        });
        if let Some(video) = built.video {
            if let Some(previous) = self.videos.insert(video.id.clone(), video) {
                warn!("Duplicate video code {}, keeping last", previous.id);
            }
        }
        self.video_files.push(built.file);
    }
}

/// Builds every converted variant, then every upload.
///
/// Records whose error is recoverable are logged and skipped.
///
/// # Errors
///
/// Returns the first fatal error from the builder.
pub fn resolve_associations(buckets: &Buckets, builder: &VideoBuilder<'_>) -> Result<Catalog> {
    let mut catalog = Catalog::default();
    let mut converted: HashMap<LegacyKey, String> = HashMap::new();

    for (key, fields) in sorted(&buckets.converted_videos) {
        info!("Processing converted video {}", key);
        match builder.build_converted(key, fields) {
            Ok(built) => {
                converted.insert(key.clone(), built.media_id.clone());
                catalog.stats.converted_built += 1;
                catalog.push(built);
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping converted video {}: {}", key, e);
                catalog.stats.converted_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for (key, fields) in sorted(&buckets.uploaded_videos) {
        info!("Processing uploaded video {}", key);
        let converted_to = key_field(fields, "converted").and_then(|c| {
            let id = converted.get(&c).cloned();
            if id.is_none() {
                debug!("Upload {}: converted variant {} unavailable", key, c);
            }
            id
        });
        let linked = converted_to.is_some();

        match builder.build(key, fields, converted_to) {
            Ok(built) => {
                catalog.stats.uploads_built += 1;
                if linked {
                    catalog.stats.linked += 1;
                }
                catalog.push(built);
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping uploaded video {}: {}", key, e);
                catalog.stats.uploads_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(catalog)
}

fn sorted(bucket: &Bucket) -> Vec<(&LegacyKey, &Fields)> {
    let mut records: Vec<_> = bucket.iter().collect();
    records.sort_by(|a, b| a.0.cmp(b.0));
    records
}
