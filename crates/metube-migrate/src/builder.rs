//! Builds store documents from legacy media records.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::classify::Bucket;
use crate::documents::{AudioCodec, ContainerFormat, Video, VideoCodec, VideoFile};
use crate::error::{Error, Result};
use crate::games::GameTable;
use crate::identity::{IdGenerator, IdentityResolver};
use crate::record::{key_field, str_field, Fields, LegacyKey};

/// Output of [`VideoBuilder::build`] for one legacy record.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltVideo {
    /// Freshly generated media id.
    pub media_id: String,
    /// Media file descriptor.
    pub file: VideoFile,
    /// Legacy short code, if the record has one.
    pub code: Option<String>,
    /// Public video, only for records with a display name.
    pub video: Option<Video>,
    /// Media path relative to the legacy base directory.
    pub source: PathBuf,
    /// Thumbnail path relative to the legacy base directory.
    pub thumbnail: Option<PathBuf>,
}

/// Turns uploaded and converted video records into documents.
pub struct VideoBuilder<'a> {
    source_root: &'a Path,
    check_existing: bool,
    games: &'a GameTable,
    thumbnails: &'a Bucket,
    identities: &'a dyn IdentityResolver,
    ids: &'a dyn IdGenerator,
}

impl<'a> VideoBuilder<'a> {
    /// Creates a builder reading media from `source_root`.
    pub fn new(
        source_root: &'a Path,
        games: &'a GameTable,
        thumbnails: &'a Bucket,
        identities: &'a dyn IdentityResolver,
        ids: &'a dyn IdGenerator,
    ) -> Self {
        Self {
            source_root,
            check_existing: true,
            games,
            thumbnails,
            identities,
            ids,
        }
    }

    /// Enables or disables the source file existence check.
    #[must_use]
    pub fn check_existing(mut self, enabled: bool) -> Self {
        self.check_existing = enabled;
        self
    }

    /// Builds the documents of one record.
    ///
    /// `converted_to` is the media id of the record's converted variant, if
    /// one was built.
    ///
    /// # Errors
    ///
    /// [`Error::SourceFileMissing`] is recoverable; every other error means
    /// the run must stop.
    pub fn build(
        &self,
        key: &LegacyKey,
        fields: &Fields,
        converted_to: Option<String>,
    ) -> Result<BuiltVideo> {
        self.build_record(key, fields, converted_to, true)
    }

    /// Builds the media file of a converted variant.
    ///
    /// Converted variants never get a public video, whatever fields they
    /// carry, so owner and game are not resolved.
    ///
    /// # Errors
    ///
    /// Same as [`VideoBuilder::build`].
    pub fn build_converted(&self, key: &LegacyKey, fields: &Fields) -> Result<BuiltVideo> {
        self.build_record(key, fields, None, false)
    }

    fn build_record(
        &self,
        key: &LegacyKey,
        fields: &Fields,
        converted_to: Option<String>,
        public: bool,
    ) -> Result<BuiltVideo> {
        let media_id = self.ids.next_id();

        let relative = required_str(key, fields, "file")?;
        let path = self.source_root.join(relative);
        if self.check_existing && !path.exists() {
            return Err(Error::SourceFileMissing {
                key: key.clone(),
                path,
            });
        }

        let ext = relative.rsplit('.').next().unwrap_or(relative);
        let format =
            ContainerFormat::from_extension(ext).ok_or_else(|| Error::UnsupportedFormat {
                key: key.clone(),
                format: ext.to_string(),
            })?;

        let audio = required_str(key, fields, "codec_audio")?;
        let audio_codec = AudioCodec::parse(audio).ok_or_else(|| Error::UnsupportedAudioCodec {
            key: key.clone(),
            codec: audio.to_string(),
        })?;

        let video = required_str(key, fields, "codec_video")?;
        let video_codec = VideoCodec::parse(video).ok_or_else(|| Error::UnsupportedVideoCodec {
            key: key.clone(),
            codec: video.to_string(),
        })?;

        let file = VideoFile {
            id: media_id.clone(),
            duration: parse_duration(fields.get("_duration")),
            audio_codec,
            video_codec,
            format,
            converted: converted_to,
        };

        let code = str_field(fields, "code").map(str::to_string);
        let video = match str_field(fields, "custom_name").filter(|_| public) {
            Some(name) => Some(self.build_video(key, fields, &media_id, name)?),
            None => None,
        };

        Ok(BuiltVideo {
            media_id,
            file,
            code,
            video,
            source: PathBuf::from(relative),
            thumbnail: self.thumbnail_for(key, fields),
        })
    }

    fn build_video(
        &self,
        key: &LegacyKey,
        fields: &Fields,
        media_id: &str,
        name: &str,
    ) -> Result<Video> {
        let code = required_str(key, fields, "code")?;
        let game = self.games.resolve(key_field(fields, "game").as_ref())?;
        let owner_key = key_field(fields, "owner").ok_or_else(|| Error::MissingField {
            key: key.clone(),
            field: "owner",
        })?;
        let owner = self.identities.resolve_user(&owner_key)?;
        let added = required_str(key, fields, "added")?;
        let added = normalize_timestamp(added).ok_or_else(|| Error::MalformedTimestamp {
            key: key.clone(),
            value: added.to_string(),
        })?;

        Ok(Video {
            id: code.to_string(),
            file: media_id.to_string(),
            name: name.to_string(),
            game: game.to_string(),
            public: fields
                .get("public")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            owner,
            added,
        })
    }

    fn thumbnail_for(&self, key: &LegacyKey, fields: &Fields) -> Option<PathBuf> {
        let thumb_key = key_field(fields, "thumbnail")?;
        match self
            .thumbnails
            .get(&thumb_key)
            .and_then(|t| str_field(t, "file"))
        {
            Some(file) => Some(PathBuf::from(file)),
            None => {
                warn!("Record {}: thumbnail {} not in export", key, thumb_key);
                None
            }
        }
    }
}

fn required_str<'f>(key: &LegacyKey, fields: &'f Fields, field: &'static str) -> Result<&'f str> {
    str_field(fields, field).ok_or_else(|| Error::MissingField {
        key: key.clone(),
        field,
    })
}

fn parse_duration(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Reinterprets a legacy naive timestamp as UTC and renders it as RFC 3339
/// with a `Z` suffix. Timestamps with an explicit offset are converted.
#[must_use]
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    let utc: DateTime<Utc> = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?
            .and_utc(),
    };
    Some(utc.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
