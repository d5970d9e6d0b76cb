//! Tests for the video descriptor builder.

use super::*;
use crate::error::Severity;
use crate::identity::{SequentialIds, StaticIdentityTable};
use serde_json::json;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    games: GameTable,
    thumbnails: Bucket,
    identities: StaticIdentityTable,
    ids: SequentialIds,
}

impl Fixture {
    fn new(files: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        for f in files {
            std::fs::write(dir.path().join(f), b"media").unwrap();
        }
        let identities = StaticIdentityTable::legacy_default();
        let ids = SequentialIds::new();
        let mut games = Bucket::new();
        games.insert(
            LegacyKey::Int(7),
            json!({"name": "Retro", "users": [1]})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let games = GameTable::build(&games, &identities, &ids).unwrap();
        let mut thumbnails = Bucket::new();
        thumbnails.insert(
            LegacyKey::Int(30),
            json!({"file": "thumbs/clip.jpg"}).as_object().cloned().unwrap(),
        );
        Self {
            dir,
            games,
            thumbnails,
            identities,
            ids,
        }
    }

    fn builder(&self) -> VideoBuilder<'_> {
        VideoBuilder::new(
            self.dir.path(),
            &self.games,
            &self.thumbnails,
            &self.identities,
            &self.ids,
        )
    }
}

fn upload(file: &str, audio: &str, video: &str) -> Fields {
    json!({
        "file": file,
        "code": "abc123",
        "custom_name": "Clip",
        "codec_audio": audio,
        "codec_video": video,
        "_duration": 12.5,
        "game": 7,
        "public": true,
        "owner": 1,
        "added": "2023-11-20T21:24:26.878",
        "thumbnail": null,
        "converted": null
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[test]
fn test_build_all_supported_combinations() {
    let fx = Fixture::new(&["clip.mp4", "clip.mkv"]);
    let builder = fx.builder();

    for ext in ["mp4", "mkv"] {
        for audio in ["aac", "mp3"] {
            for video in ["h264", "hevc"] {
                let fields = upload(&format!("clip.{ext}"), audio, video);
                let built = builder.build(&LegacyKey::Int(1), &fields, None).unwrap();

                let doc = serde_json::to_value(&built.file).unwrap();
                assert_eq!(doc["format"], ext);
                assert_eq!(doc["audio_codec"], audio);
                assert_eq!(doc["video_codec"], video);
                assert_eq!(built.file.duration, Some(12.5));
            }
        }
    }
}

#[test]
fn test_scenario_upload_builds_video() {
    let fx = Fixture::new(&["clip.mp4"]);
    let built = fx
        .builder()
        .build(&LegacyKey::Int(1), &upload("clip.mp4", "aac", "h264"), None)
        .unwrap();

    let video = built.video.unwrap();
    assert_eq!(video.id, "abc123");
    assert_eq!(video.owner, "topongo");
    assert_eq!(video.file, built.media_id);
    assert_eq!(video.game, fx.games.resolve(Some(&LegacyKey::Int(7))).unwrap());
    assert_eq!(video.added, "2023-11-20T21:24:26.878Z");
    assert!(video.public);
    assert_eq!(built.file.format, ContainerFormat::Mp4);
    assert_eq!(built.source, PathBuf::from("clip.mp4"));
    assert_eq!(built.code.as_deref(), Some("abc123"));
}

#[test]
fn test_unsupported_format_is_fatal() {
    let fx = Fixture::new(&["clip.avi"]);
    let err = fx
        .builder()
        .build(&LegacyKey::Int(1), &upload("clip.avi", "aac", "h264"), None)
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat { ref format, .. } if format == "avi"));
    assert_eq!(err.severity(), Severity::Fatal);
}

#[test]
fn test_unsupported_codecs_are_fatal() {
    let fx = Fixture::new(&["clip.mp4"]);
    let builder = fx.builder();

    let err = builder
        .build(&LegacyKey::Int(1), &upload("clip.mp4", "opus", "h264"), None)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedAudioCodec { .. }));
    assert_eq!(err.severity(), Severity::Fatal);

    let err = builder
        .build(&LegacyKey::Int(1), &upload("clip.mp4", "aac", "vp9"), None)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedVideoCodec { ref codec, .. } if codec == "vp9"));
}

#[test]
fn test_missing_source_is_recoverable() {
    let fx = Fixture::new(&[]);
    let err = fx
        .builder()
        .build(&LegacyKey::Int(1), &upload("clip.mp4", "aac", "h264"), None)
        .unwrap_err();

    assert!(err.is_recoverable());
    assert!(matches!(err, Error::SourceFileMissing { ref path, .. } if path.ends_with("clip.mp4")));
}

#[test]
fn test_skip_existing_check() {
    let fx = Fixture::new(&[]);
    let built = fx
        .builder()
        .check_existing(false)
        .build(&LegacyKey::Int(1), &upload("clip.mp4", "aac", "h264"), None);

    assert!(built.is_ok());
}

#[test]
fn test_converted_record_has_no_video() {
    let fx = Fixture::new(&["conv.mp4"]);
    let fields = json!({
        "file": "conv.mp4",
        "code": "conv1",
        "codec_audio": "aac",
        "codec_video": "h264",
        "_duration": "3.25"
    });
    let built = fx
        .builder()
        .build(&LegacyKey::Int(5), fields.as_object().unwrap(), None)
        .unwrap();

    assert!(built.video.is_none());
    assert_eq!(built.file.duration, Some(3.25));
    assert!(built.thumbnail.is_none());
}

#[test]
fn test_build_converted_skips_public_fields() {
    let fx = Fixture::new(&["conv.mp4"]);
    let mut fields = upload("conv.mp4", "aac", "h264");
    fields.insert("owner".to_string(), json!(42));
    fields.insert("game".to_string(), json!(404));

    let built = fx
        .builder()
        .build_converted(&LegacyKey::Int(5), &fields)
        .unwrap();

    assert!(built.video.is_none());
    assert_eq!(built.file.converted, None);
}

#[test]
fn test_malformed_added_reports_value() {
    let fx = Fixture::new(&["clip.mp4"]);
    let mut fields = upload("clip.mp4", "aac", "h264");
    fields.insert("added".to_string(), json!("20/11/2023"));
    let err = fx
        .builder()
        .build(&LegacyKey::Int(1), &fields, None)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::MalformedTimestamp { ref value, .. } if value == "20/11/2023"
    ));
}

#[test]
fn test_converted_to_passthrough() {
    let fx = Fixture::new(&["clip.mp4"]);
    let built = fx
        .builder()
        .build(
            &LegacyKey::Int(1),
            &upload("clip.mp4", "aac", "h264"),
            Some("feedface".to_string()),
        )
        .unwrap();

    assert_eq!(built.file.converted.as_deref(), Some("feedface"));
}

#[test]
fn test_null_game_uses_sentinel() {
    let fx = Fixture::new(&["clip.mp4"]);
    let mut fields = upload("clip.mp4", "aac", "h264");
    fields.insert("game".to_string(), Value::Null);
    let built = fx.builder().build(&LegacyKey::Int(1), &fields, None).unwrap();

    assert_eq!(built.video.unwrap().game, fx.games.sentinel().id);
}

#[test]
fn test_unknown_owner_is_fatal() {
    let fx = Fixture::new(&["clip.mp4"]);
    let mut fields = upload("clip.mp4", "aac", "h264");
    fields.insert("owner".to_string(), json!(42));
    let err = fx
        .builder()
        .build(&LegacyKey::Int(1), &fields, None)
        .unwrap_err();

    assert!(matches!(err, Error::UnknownUser(LegacyKey::Int(42))));
    assert_eq!(err.severity(), Severity::Fatal);
}

#[test]
fn test_thumbnail_resolution() {
    let fx = Fixture::new(&["clip.mp4"]);
    let builder = fx.builder();

    let mut fields = upload("clip.mp4", "aac", "h264");
    fields.insert("thumbnail".to_string(), json!(30));
    let built = builder.build(&LegacyKey::Int(1), &fields, None).unwrap();
    assert_eq!(built.thumbnail, Some(PathBuf::from("thumbs/clip.jpg")));

    fields.insert("thumbnail".to_string(), json!(31));
    let built = builder.build(&LegacyKey::Int(1), &fields, None).unwrap();
    assert!(built.thumbnail.is_none());
}

#[test]
fn test_missing_codec_field() {
    let fx = Fixture::new(&["clip.mp4"]);
    let mut fields = upload("clip.mp4", "aac", "h264");
    fields.remove("codec_audio");
    let err = fx
        .builder()
        .build(&LegacyKey::Int(1), &fields, None)
        .unwrap_err();

    assert!(matches!(err, Error::MissingField { field: "codec_audio", .. }));
}

#[test]
fn test_normalize_timestamp() {
    assert_eq!(
        normalize_timestamp("2025-02-16T15:58:39.513745").as_deref(),
        Some("2025-02-16T15:58:39.513745Z")
    );
    assert_eq!(
        normalize_timestamp("2023-11-20T21:24:26").as_deref(),
        Some("2023-11-20T21:24:26Z")
    );
    assert_eq!(
        normalize_timestamp("2023-11-20 21:24:26.5").as_deref(),
        Some("2023-11-20T21:24:26.500Z")
    );
    assert_eq!(
        normalize_timestamp("2023-11-20T23:24:26+02:00").as_deref(),
        Some("2023-11-20T21:24:26Z")
    );
    assert_eq!(normalize_timestamp("yesterday"), None);
}
