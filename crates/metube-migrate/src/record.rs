//! Raw records of the legacy export and the file reader producing them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};

/// Largest export accepted by [`load_export`] (512MB).
pub const MAX_EXPORT_SIZE: u64 = 512 * 1024 * 1024;

/// Field mapping of a record.
pub type Fields = Map<String, Value>;

/// Primary key a record had in the legacy relational database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyKey {
    /// Integer primary key.
    Int(i64),
    /// Textual primary key.
    Str(String),
}

impl LegacyKey {
    /// Reads a foreign-key reference. `null` and non-key values yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for LegacyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for LegacyKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for LegacyKey {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for LegacyKey {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// One entry of the export: `{model, pk, fields}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Declared type tag (e.g. `video_share.uploadedvideo`).
    pub model: String,
    /// Legacy primary key.
    pub pk: LegacyKey,
    /// Column values.
    #[serde(default)]
    pub fields: Fields,
}

impl RawRecord {
    /// Creates a record.
    pub fn new(model: impl Into<String>, pk: impl Into<LegacyKey>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            model: model.into(),
            pk: pk.into(),
            fields,
        }
    }
}

/// Reads the whole export file into memory.
///
/// # Errors
///
/// Returns an error if the file is missing, too large or not a JSON array of
/// records.
pub fn load_export(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).map_err(|e| {
        Error::Export(format!(
            "Failed to open export file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let size = file.metadata()?.len();
    if size > MAX_EXPORT_SIZE {
        return Err(Error::Export(format!(
            "Export file '{}' is {} bytes, limit is {}",
            path.display(),
            size,
            MAX_EXPORT_SIZE
        )));
    }

    let records: Vec<RawRecord> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::Export(format!("Failed to parse export: {}", e)))?;
    Ok(records)
}

/// String field accessor.
pub(crate) fn str_field<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

/// Foreign-key field accessor; `null` or absent yields `None`.
pub(crate) fn key_field(fields: &Fields, name: &str) -> Option<LegacyKey> {
    fields.get(name).and_then(LegacyKey::from_value)
}
