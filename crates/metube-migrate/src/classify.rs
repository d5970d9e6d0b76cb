//! Record classification into typed buckets.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::record::{Fields, LegacyKey, RawRecord};

/// Type tags of the legacy export that carry nothing worth migrating.
pub const DEFAULT_IGNORED: &[&str] = &[
    "moviedb.movie",
    "moviedb.thread",
    "moviedb.episode",
    "moviedb.series",
    "moviedb.file",
    "moviedb.imdbentity",
    "video_share.ffmpegjob",
    "base.token",
    "base.ip",
    "sessions.session",
    "contenttypes.contenttype",
    "auth.permission",
    "admin.logentry",
];

/// Bucket a handled record lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKind {
    /// `base.user`
    User,
    /// `video_share.uploadedvideo`
    UploadedVideo,
    /// `video_share.convertedvideo`
    ConvertedVideo,
    /// `video_share.thumbnail`
    Thumbnail,
    /// `video_share.game`
    Game,
}

impl BucketKind {
    /// Default tag for this bucket.
    #[must_use]
    pub const fn default_tag(self) -> &'static str {
        match self {
            Self::User => "base.user",
            Self::UploadedVideo => "video_share.uploadedvideo",
            Self::ConvertedVideo => "video_share.convertedvideo",
            Self::Thumbnail => "video_share.thumbnail",
            Self::Game => "video_share.game",
        }
    }

    const ALL: [Self; 5] = [
        Self::User,
        Self::UploadedVideo,
        Self::ConvertedVideo,
        Self::Thumbnail,
        Self::Game,
    ];
}

/// Records of one type keyed by legacy key.
pub type Bucket = HashMap<LegacyKey, Fields>;

/// The five typed buckets produced by [`Classifier::classify`].
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    /// Legacy users.
    pub users: Bucket,
    /// Uploaded (public-facing) videos.
    pub uploaded_videos: Bucket,
    /// Re-encoded variants of uploads.
    pub converted_videos: Bucket,
    /// Thumbnail records.
    pub thumbnails: Bucket,
    /// Games (groups).
    pub games: Bucket,
}

impl Buckets {
    fn bucket_mut(&mut self, kind: BucketKind) -> &mut Bucket {
        match kind {
            BucketKind::User => &mut self.users,
            BucketKind::UploadedVideo => &mut self.uploaded_videos,
            BucketKind::ConvertedVideo => &mut self.converted_videos,
            BucketKind::Thumbnail => &mut self.thumbnails,
            BucketKind::Game => &mut self.games,
        }
    }
}

/// What happened to records that did not land in a bucket.
#[derive(Debug, Clone, Default)]
pub struct ClassifyReport {
    /// Records dropped because their tag is in the ignore set.
    pub ignored: u64,
    /// Unknown tags with their occurrence count.
    pub unknown: BTreeMap<String, u64>,
}

impl ClassifyReport {
    /// Total records with an unknown tag.
    #[must_use]
    pub fn unknown_total(&self) -> u64 {
        self.unknown.values().sum()
    }
}

/// Partitions a heterogeneous record stream by type tag.
#[derive(Debug, Clone)]
pub struct Classifier {
    ignored: HashSet<String>,
    handled: HashMap<String, BucketKind>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            ignored: DEFAULT_IGNORED.iter().map(|s| (*s).to_string()).collect(),
            handled: BucketKind::ALL
                .iter()
                .map(|k| (k.default_tag().to_string(), *k))
                .collect(),
        }
    }
}

impl Classifier {
    /// Creates a classifier with the default tag sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds tags to the ignore set.
    #[must_use]
    pub fn with_ignored<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Splits `records` into buckets. Repeated keys keep the last record.
    pub fn classify<I>(&self, records: I) -> (Buckets, ClassifyReport)
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut buckets = Buckets::default();
        let mut report = ClassifyReport::default();

        for record in records {
            if self.ignored.contains(&record.model) {
                report.ignored += 1;
                continue;
            }
            match self.handled.get(&record.model) {
                Some(kind) => {
                    if buckets
                        .bucket_mut(*kind)
                        .insert(record.pk.clone(), record.fields)
                        .is_some()
                    {
                        debug!("Duplicate {} record {}, keeping last", record.model, record.pk);
                    }
                }
                None => {
                    warn!("Unknown model: {}", record.model);
                    *report.unknown.entry(record.model).or_insert(0) += 1;
                }
            }
        }

        (buckets, report)
    }
}
