//! Error types for metube-migrate.
//!
//! Every error carries a [`Severity`] so the pipeline can decide whether a
//! failure skips one record or aborts the run without matching on variants.

use std::path::PathBuf;
use thiserror::Error;

use crate::record::LegacyKey;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How a failure propagates through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stops the run. The tool is out of date or the data is inconsistent.
    Fatal,
    /// Skips the offending record; the batch continues.
    Recoverable,
    /// Rejected before any record is processed.
    Configuration,
}

/// Errors that can occur during a migration run.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or conflicting configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Legacy user id missing from the identity table.
    #[error("Unknown legacy user id {0}")]
    UnknownUser(LegacyKey),

    /// Legacy game key referenced by a video but absent from the export.
    #[error("Unknown legacy game {0}")]
    UnknownGame(LegacyKey),

    /// Media file referenced by a record does not exist in the source tree.
    #[error("Source file not found: {}", path.display())]
    SourceFileMissing {
        /// Legacy key of the record.
        key: LegacyKey,
        /// Expected location of the file.
        path: PathBuf,
    },

    /// Container extension is not mp4 or mkv.
    #[error("Unsupported format '{format}' for record {key}")]
    UnsupportedFormat {
        /// Legacy key of the record.
        key: LegacyKey,
        /// Offending extension.
        format: String,
    },

    /// Audio codec is not aac or mp3.
    #[error("Unsupported audio codec '{codec}' for record {key}")]
    UnsupportedAudioCodec {
        /// Legacy key of the record.
        key: LegacyKey,
        /// Offending codec name.
        codec: String,
    },

    /// Video codec is not h264 or hevc.
    #[error("Unsupported video codec '{codec}' for record {key}")]
    UnsupportedVideoCodec {
        /// Legacy key of the record.
        key: LegacyKey,
        /// Offending codec name.
        codec: String,
    },

    /// Required field missing or of the wrong type.
    #[error("Record {key}: field '{field}' is missing or malformed")]
    MissingField {
        /// Legacy key of the record.
        key: LegacyKey,
        /// Field name.
        field: &'static str,
    },

    /// Timestamp field that is neither RFC 3339 nor a naive datetime.
    #[error("Record {key}: cannot parse timestamp '{value}'")]
    MalformedTimestamp {
        /// Legacy key of the record.
        key: LegacyKey,
        /// Raw value as found in the export.
        value: String,
    },

    /// Planned source disappeared before materialization.
    #[error("Source file vanished before materialization: {}", .0.display())]
    SourceVanished(PathBuf),

    /// Export file could not be parsed.
    #[error("Export error: {0}")]
    Export(String),

    /// Document store rejected an operation.
    #[error("Store error: {0}")]
    Store(String),

    /// Store authentication failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Store is rate limiting requests.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimit(u64),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Returns how this error propagates.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::SourceFileMissing { .. } => Severity::Recoverable,
            Self::Config(_) => Severity::Configuration,
            _ => Severity::Fatal,
        }
    }

    /// True if the caller may skip the record and continue.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity() == Severity::Recoverable
    }
}
