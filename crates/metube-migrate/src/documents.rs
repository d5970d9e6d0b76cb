//! Documents written to the MeTube store.

use serde::{Deserialize, Serialize};

/// Collection holding [`Game`] documents.
pub const GAMES: &str = "games";
/// Collection holding [`GameUser`] documents.
pub const GAME_USERS: &str = "game_users";
/// Collection holding [`VideoFile`] documents.
pub const VIDEO_FILES: &str = "video_files";
/// Collection holding [`Video`] documents.
pub const VIDEOS: &str = "videos";

/// Name of the placeholder game for videos without one.
pub const NO_GAME: &str = "No game";

/// Audio codecs the backend can stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// Advanced Audio Coding.
    Aac,
    /// MPEG-1 Layer III.
    Mp3,
}

impl AudioCodec {
    /// Parses a legacy codec name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "aac" => Some(Self::Aac),
            "mp3" => Some(Self::Mp3),
            _ => None,
        }
    }
}

/// Video codecs the backend can stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 / AVC.
    H264,
    /// H.265 / HEVC.
    Hevc,
}

impl VideoCodec {
    /// Parses a legacy codec name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "h264" => Some(Self::H264),
            "hevc" => Some(Self::Hevc),
            _ => None,
        }
    }
}

/// Container formats the backend can stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// MPEG-4 Part 14.
    Mp4,
    /// Matroska.
    Mkv,
}

impl ContainerFormat {
    /// Parses a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp4" => Some(Self::Mp4),
            "mkv" => Some(Self::Mkv),
            _ => None,
        }
    }
}

/// A group of users sharing videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Opaque id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Membership edge between a user and a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameUser {
    /// Username.
    pub user: String,
    /// Game id.
    pub game: String,
}

/// Stored media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    /// Opaque id, also the file name under the storage root.
    #[serde(rename = "_id")]
    pub id: String,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Audio codec.
    pub audio_codec: AudioCodec,
    /// Video codec.
    pub video_codec: VideoCodec,
    /// Container format.
    pub format: ContainerFormat,
    /// Media id of the converted variant of this file.
    pub converted: Option<String>,
}

/// Public-facing video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Legacy short code, kept because external links address videos by it.
    #[serde(rename = "_id")]
    pub id: String,
    /// [`VideoFile`] id.
    pub file: String,
    /// Display name.
    pub name: String,
    /// [`Game`] id.
    pub game: String,
    /// Whether anyone can watch it.
    pub public: bool,
    /// Owner username.
    pub owner: String,
    /// Upload time, RFC 3339 in UTC.
    pub added: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_parse() {
        assert_eq!(AudioCodec::parse("aac"), Some(AudioCodec::Aac));
        assert_eq!(AudioCodec::parse("opus"), None);
        assert_eq!(VideoCodec::parse("hevc"), Some(VideoCodec::Hevc));
        assert_eq!(VideoCodec::parse("vp9"), None);
        assert_eq!(ContainerFormat::from_extension("mkv"), Some(ContainerFormat::Mkv));
        assert_eq!(ContainerFormat::from_extension("webm"), None);
    }

    #[test]
    fn test_video_file_document_shape() {
        let file = VideoFile {
            id: "abc".to_string(),
            duration: Some(12.5),
            audio_codec: AudioCodec::Mp3,
            video_codec: VideoCodec::H264,
            format: ContainerFormat::Mp4,
            converted: None,
        };

        let doc = serde_json::to_value(&file).unwrap();
        assert_eq!(
            doc,
            serde_json::json!({
                "_id": "abc",
                "duration": 12.5,
                "audio_codec": "mp3",
                "video_codec": "h264",
                "format": "mp4",
                "converted": null
            })
        );
    }
}
